/// Client-specific result type
pub type Result<T> = std::result::Result<T, PerplexityError>;

/// Errors from the Perplexity client
#[derive(Debug, thiserror::Error)]
pub enum PerplexityError {
    /// A request field violated its domain
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// Human-readable reason
        reason: String,
    },

    /// `search_recency_filter` was not one of the recognized tokens
    #[error("invalid search_recency_filter `{0}`: must be one of: month, week, day, hour")]
    InvalidRecencyFilter(String),

    /// Invalid configuration (e.g. no API key resolvable)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// HTTP transport error (connection failure, protocol error)
    #[error("error making request to Perplexity API: {0}")]
    Http(#[from] reqwest::Error),

    /// Request phase exceeded its bound before response headers arrived
    #[error("request to Perplexity API timed out after {0} seconds")]
    Timeout(u64),

    /// Server returned a non-success status
    #[error("Perplexity API returned {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error body, verbatim
        message: String,
    },

    /// Failed to parse a whole-body response
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Stream transport encountered an error mid-consumption
    #[error("stream error: {0}")]
    Stream(String),
}
