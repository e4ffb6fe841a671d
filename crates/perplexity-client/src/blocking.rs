//! Blocking client
//!
//! Mirrors the async [`crate::PerplexityClient`] over `reqwest::blocking`.
//! Must not be used from within an async runtime; the callback bridge in
//! [`TokenCallback`] covers notifying async observers from this path.

use std::io::{BufRead, BufReader};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::accumulate::{LineEvent, ResponseAccumulator};
use crate::auth;
use crate::callback::TokenCallback;
use crate::client::{DEFAULT_BASE_URL, REQUEST_TIMEOUT};
use crate::error::{PerplexityError, Result};
use crate::types::{ChatRequest, ChatResponse};

/// Blocking client for the Perplexity chat completions API
#[derive(Debug, Clone)]
pub struct PerplexityClient {
    http: reqwest::blocking::Client,
    base_url: Url,
    api_key: SecretString,
    request_timeout: Duration,
}

impl PerplexityClient {
    /// Create a client
    ///
    /// Key resolution matches the async client: explicit parameter first,
    /// then `PERPLEXITY_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns [`PerplexityError::Config`] when no key is resolvable or the
    /// HTTP client cannot be built.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never
    /// happen).
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        let api_key = auth::resolve_api_key(api_key)?;

        Ok(Self {
            http: build_http(REQUEST_TIMEOUT)?,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("valid default URL"),
            api_key,
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    /// Override the endpoint URL (tests, self-hosted gateways)
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Override the request-phase timeout (default 60 seconds)
    ///
    /// Bounds connecting and the wait for response headers on every call,
    /// the whole body on non-streaming calls, and any silence between
    /// stream reads.
    ///
    /// # Errors
    ///
    /// Returns [`PerplexityError::Config`] if the HTTP client cannot be
    /// rebuilt with the new timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.request_timeout = timeout;
        self.http = build_http(timeout)?;
        Ok(self)
    }

    /// Send a chat completion request, blocking until complete
    ///
    /// Non-streaming requests return the parsed body; streaming requests
    /// block for the whole stream and return the accumulated response.
    /// `callback` fires once per chunk carrying non-empty content:
    /// [`TokenCallback::Sync`] inline on this thread,
    /// [`TokenCallback::Async`] fire-and-forget (see [`TokenCallback`]).
    ///
    /// # Errors
    ///
    /// Returns a validation error before any I/O when the request violates a
    /// field domain; otherwise transport failures, non-2xx statuses, and
    /// body/stream errors. A single malformed streamed chunk is skipped, not
    /// an error.
    pub fn chat_completion(
        &self,
        request: &ChatRequest,
        mut callback: Option<TokenCallback>,
    ) -> Result<ChatResponse> {
        request.validate()?;

        let mut builder = self
            .http
            .post(self.base_url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .json(request);

        if !request.stream {
            builder = builder.timeout(self.request_timeout);
        }

        let response = builder.send().map_err(|e| {
            if e.is_timeout() {
                PerplexityError::Timeout(self.request_timeout.as_secs())
            } else {
                e.into()
            }
        })?;
        let response = check_status(response)?;

        if !request.stream {
            return response.json().map_err(|e| PerplexityError::Parse(e.to_string()));
        }

        let mut accumulator = ResponseAccumulator::new();
        let reader = BufReader::new(response);

        for line in reader.lines() {
            let line = line.map_err(|e| PerplexityError::Stream(e.to_string()))?;
            match accumulator.feed_line(&line) {
                LineEvent::Fragment(fragment) => {
                    if let Some(callback) = callback.as_mut() {
                        callback.notify(&fragment);
                    }
                }
                LineEvent::Done => break,
                LineEvent::Ignored => {}
            }
        }

        Ok(accumulator.into_response())
    }
}

/// No client-wide total timeout (it would cut live streams short): the read
/// timeout bounds the wait for response headers and, as a side effect, any
/// silence between stream reads.
fn build_http(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(None)
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()
        .map_err(|e| PerplexityError::Config(format!("failed to build HTTP client: {e}")))
}

fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().unwrap_or_default();
    Err(PerplexityError::Api {
        status: status.as_u16(),
        message,
    })
}
