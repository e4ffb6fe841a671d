use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::message::Message;
use crate::error::{PerplexityError, Result};

/// Model used when none is specified
pub const DEFAULT_MODEL: &str = "llama-3.1-sonar-large-128k-online";

/// Recency window for web-search results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecencyFilter {
    /// Results from the past month
    Month,
    /// Results from the past week
    Week,
    /// Results from the past day
    Day,
    /// Results from the past hour
    Hour,
}

impl FromStr for RecencyFilter {
    type Err = PerplexityError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "month" => Ok(Self::Month),
            "week" => Ok(Self::Week),
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            other => Err(PerplexityError::InvalidRecencyFilter(other.to_owned())),
        }
    }
}

impl RecencyFilter {
    /// Wire representation of the filter
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Month => "month",
            Self::Week => "week",
            Self::Day => "day",
            Self::Hour => "hour",
        }
    }
}

impl std::fmt::Display for RecencyFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chat completion request
///
/// Construct through [`ChatRequest::new`] (all defaults) or
/// [`ChatRequest::builder`]; `build` validates every field domain before the
/// request can reach the network. Absent optional fields are omitted from
/// the serialized body entirely, never emitted as null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatRequest {
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Conversation messages, in order
    pub messages: Vec<Message>,
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature, in `[0, 2)`
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Nucleus sampling threshold, in `[0, 1]`
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Include source citations in the response
    #[serde(default)]
    pub return_citations: bool,
    /// Restrict web search to these domains (at most 3)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_domain_filter: Option<Vec<String>>,
    /// Include image results in the response
    #[serde(default)]
    pub return_images: bool,
    /// Return related questions alongside the answer
    #[serde(default)]
    pub return_related_questions: bool,
    /// Restrict web search by recency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_recency_filter: Option<RecencyFilter>,
    /// Top-k sampling cutoff, in `[0, 2048]` (0 disables)
    #[serde(default)]
    pub top_k: u32,
    /// Whether to stream the response
    #[serde(default = "default_true")]
    pub stream: bool,
    /// Presence penalty, in `[-2, 2]`
    #[serde(default)]
    pub presence_penalty: f64,
    /// Frequency penalty, non-negative
    #[serde(default = "default_frequency_penalty")]
    pub frequency_penalty: f64,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

const fn default_temperature() -> f64 {
    0.2
}

const fn default_top_p() -> f64 {
    0.9
}

const fn default_frequency_penalty() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}

impl ChatRequest {
    /// Create a request with the given messages and default parameters
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            model: default_model(),
            messages,
            max_tokens: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
            return_citations: false,
            search_domain_filter: None,
            return_images: false,
            return_related_questions: false,
            search_recency_filter: None,
            top_k: 0,
            stream: true,
            presence_penalty: 0.0,
            frequency_penalty: default_frequency_penalty(),
        }
    }

    /// Start building a request with the given messages
    pub fn builder(messages: Vec<Message>) -> ChatRequestBuilder {
        ChatRequestBuilder {
            request: Self::new(messages),
            search_recency_filter: None,
        }
    }

    /// Check every field domain
    ///
    /// Called by [`ChatRequestBuilder::build`] and again by the client before
    /// any I/O, so a hand-constructed or deserialized request cannot bypass
    /// validation.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..2.0).contains(&self.temperature) {
            return Err(domain_error("temperature", &self.temperature, "in [0, 2)"));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(domain_error("top_p", &self.top_p, "in [0, 1]"));
        }
        if self.top_k > 2048 {
            return Err(domain_error("top_k", &self.top_k, "in [0, 2048]"));
        }
        if !(-2.0..=2.0).contains(&self.presence_penalty) {
            return Err(domain_error("presence_penalty", &self.presence_penalty, "in [-2, 2]"));
        }
        if self.frequency_penalty < 0.0 {
            return Err(domain_error(
                "frequency_penalty",
                &self.frequency_penalty,
                "non-negative",
            ));
        }
        if self.max_tokens == Some(0) {
            return Err(domain_error("max_tokens", &0, "a positive integer"));
        }
        if let Some(domains) = &self.search_domain_filter
            && domains.len() > 3
        {
            return Err(PerplexityError::Validation {
                field: "search_domain_filter",
                reason: format!("at most 3 entries allowed, got {}", domains.len()),
            });
        }
        Ok(())
    }
}

fn domain_error(
    field: &'static str,
    value: &dyn std::fmt::Display,
    expected: &str,
) -> PerplexityError {
    PerplexityError::Validation {
        field,
        reason: format!("{value} is not {expected}"),
    }
}

/// Builder for [`ChatRequest`]
///
/// `search_recency_filter` is accepted as a raw string and parsed at build
/// time so an unrecognized token fails construction with a distinct error.
#[derive(Debug)]
pub struct ChatRequestBuilder {
    request: ChatRequest,
    search_recency_filter: Option<String>,
}

impl ChatRequestBuilder {
    /// Set the model identifier
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.request.model = model.into();
        self
    }

    /// Set the maximum number of tokens to generate
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.request.max_tokens = Some(max_tokens);
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn temperature(mut self, temperature: f64) -> Self {
        self.request.temperature = temperature;
        self
    }

    /// Set the nucleus sampling threshold
    #[must_use]
    pub const fn top_p(mut self, top_p: f64) -> Self {
        self.request.top_p = top_p;
        self
    }

    /// Request source citations
    #[must_use]
    pub const fn return_citations(mut self, enabled: bool) -> Self {
        self.request.return_citations = enabled;
        self
    }

    /// Restrict web search to the given domains
    #[must_use]
    pub fn search_domain_filter(mut self, domains: Vec<String>) -> Self {
        self.request.search_domain_filter = Some(domains);
        self
    }

    /// Request image results
    #[must_use]
    pub const fn return_images(mut self, enabled: bool) -> Self {
        self.request.return_images = enabled;
        self
    }

    /// Request related questions
    #[must_use]
    pub const fn return_related_questions(mut self, enabled: bool) -> Self {
        self.request.return_related_questions = enabled;
        self
    }

    /// Restrict web search by recency (`"month"`, `"week"`, `"day"`, `"hour"`)
    #[must_use]
    pub fn search_recency_filter(mut self, filter: impl Into<String>) -> Self {
        self.search_recency_filter = Some(filter.into());
        self
    }

    /// Set the top-k sampling cutoff
    #[must_use]
    pub const fn top_k(mut self, top_k: u32) -> Self {
        self.request.top_k = top_k;
        self
    }

    /// Enable or disable streaming
    #[must_use]
    pub const fn stream(mut self, stream: bool) -> Self {
        self.request.stream = stream;
        self
    }

    /// Set the presence penalty
    #[must_use]
    pub const fn presence_penalty(mut self, presence_penalty: f64) -> Self {
        self.request.presence_penalty = presence_penalty;
        self
    }

    /// Set the frequency penalty
    #[must_use]
    pub const fn frequency_penalty(mut self, frequency_penalty: f64) -> Self {
        self.request.frequency_penalty = frequency_penalty;
        self
    }

    /// Validate every field and produce the request
    ///
    /// # Errors
    ///
    /// Returns [`PerplexityError::Validation`] when a field is outside its
    /// domain, or [`PerplexityError::InvalidRecencyFilter`] for an
    /// unrecognized recency token.
    pub fn build(mut self) -> Result<ChatRequest> {
        if let Some(raw) = self.search_recency_filter.take() {
            self.request.search_recency_filter = Some(raw.parse()?);
        }
        self.request.validate()?;
        Ok(self.request)
    }
}
