use serde::{Deserialize, Serialize};

/// Token usage statistics
///
/// Fields are nullable so the stream-start skeleton can carry an empty
/// usage object; a `usage` key in any chunk replaces the whole struct.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    /// Tokens generated in the completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    /// Total tokens (prompt + completion)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

/// Message content within a response choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    /// Always `"assistant"` for completions
    pub role: String,
    /// Text content
    #[serde(default)]
    pub content: String,
}

impl ResponseMessage {
    fn assistant() -> Self {
        Self {
            role: "assistant".to_owned(),
            content: String::new(),
        }
    }
}

impl Default for ResponseMessage {
    fn default() -> Self {
        Self::assistant()
    }
}

/// A single completion choice
///
/// During stream accumulation `message.content` and `delta.content` both
/// receive every fragment, so either field ends up holding the full
/// transcript. Downstream callers depend on this mirrored accumulation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseChoice {
    /// Index of this choice (always 0)
    #[serde(default)]
    pub index: u32,
    /// Why generation stopped, as reported by the server
    #[serde(default)]
    pub finish_reason: Option<String>,
    /// Accumulated message
    #[serde(default)]
    pub message: ResponseMessage,
    /// Accumulated deltas (mirrors `message`)
    #[serde(default)]
    pub delta: ResponseMessage,
}

/// Chat completion response
///
/// Non-streaming calls deserialize the body directly into this type;
/// streaming calls fold every chunk into one via the accumulator and return
/// it as if it were a whole response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Unique response identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Object type, `"chat.completion"`
    #[serde(default)]
    pub object: String,
    /// Unix timestamp of creation
    #[serde(default)]
    pub created: Option<u64>,
    /// Model used for generation
    #[serde(default)]
    pub model: Option<String>,
    /// Generated choices
    #[serde(default)]
    pub choices: Vec<ResponseChoice>,
    /// Source URLs cited by the answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<String>>,
    /// Token usage statistics
    #[serde(default)]
    pub usage: Usage,
}

impl ChatResponse {
    /// Empty response skeleton used at stream start
    pub fn skeleton() -> Self {
        Self {
            id: None,
            object: "chat.completion".to_owned(),
            created: None,
            model: None,
            choices: vec![ResponseChoice::default()],
            citations: None,
            usage: Usage::default(),
        }
    }

    /// Text content of the first choice, if any
    pub fn text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }

    /// Finish reason of the first choice, if any
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.finish_reason.as_deref())
    }
}
