//! API key resolution

use secrecy::SecretString;

use crate::error::{PerplexityError, Result};

/// Environment variable consulted when no explicit key is given
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// Resolve the API key: explicit parameter first, then the environment
///
/// # Errors
///
/// Returns [`PerplexityError::Config`] if neither source yields a
/// non-empty key. Resolved at client construction, before any I/O.
pub(crate) fn resolve_api_key(explicit: Option<&str>) -> Result<SecretString> {
    if let Some(key) = explicit {
        return Ok(SecretString::from(key.to_owned()));
    }

    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.is_empty() => Ok(SecretString::from(key)),
        _ => Err(PerplexityError::Config(format!(
            "API key must be provided either as a parameter or through the {API_KEY_ENV} environment variable"
        ))),
    }
}
