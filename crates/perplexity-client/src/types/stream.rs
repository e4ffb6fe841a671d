//! Wire format of streamed chat completion chunks
//!
//! Every field is optional: the accumulator only overwrites what a chunk
//! actually carries.

use serde::Deserialize;

use super::response::Usage;

/// One JSON-encoded unit of a streamed response
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    /// Response identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Object type (e.g. `"chat.completion.chunk"`)
    #[serde(default)]
    pub object: Option<String>,
    /// Unix timestamp of creation
    #[serde(default)]
    pub created: Option<u64>,
    /// Model used for generation
    #[serde(default)]
    pub model: Option<String>,
    /// Source URLs cited so far
    #[serde(default)]
    pub citations: Option<Vec<String>>,
    /// Incremental choice updates
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    /// Usage statistics (typically on the final chunk)
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// Incremental update for one choice
#[derive(Debug, Default, Deserialize)]
pub struct StreamChoice {
    /// Choice index this update belongs to
    #[serde(default)]
    pub index: u32,
    /// Incremental content
    #[serde(default)]
    pub delta: StreamDelta,
    /// Reason generation finished (present on the final chunk)
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Incremental content within a stream choice
#[derive(Debug, Default, Deserialize)]
pub struct StreamDelta {
    /// Role (present on the first chunk only)
    #[serde(default)]
    pub role: Option<String>,
    /// Incremental text content
    #[serde(default)]
    pub content: Option<String>,
}
