use std::time::Duration;

use eventsource_stream::Eventsource;
use futures_util::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::accumulate::{LineEvent, ResponseAccumulator};
use crate::auth;
use crate::callback::AsyncTokenCallback;
use crate::error::{PerplexityError, Result};
use crate::types::{ChatRequest, ChatResponse};

/// Chat completions endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai/chat/completions";

/// Bound on the request phase; once streaming has begun, individual line
/// arrivals are not bounded
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Async client for the Perplexity chat completions API
#[derive(Debug, Clone)]
pub struct PerplexityClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    request_timeout: Duration,
}

impl PerplexityClient {
    /// Create a client
    ///
    /// The API key is taken from the parameter when given, otherwise from
    /// the `PERPLEXITY_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`PerplexityError::Config`] when no key is resolvable or the
    /// HTTP client cannot be built. No network call is attempted.
    ///
    /// # Panics
    ///
    /// Panics if the hardcoded default base URL is invalid (should never
    /// happen).
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        let api_key = auth::resolve_api_key(api_key)?;
        let http = reqwest::Client::builder()
            .connect_timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PerplexityError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
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
    /// Bounds the wait for response headers on every call, and the whole
    /// body on non-streaming calls. A live stream is never cut.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Send a chat completion request
    ///
    /// With `request.stream` unset the parsed response body is returned
    /// directly. With streaming the server-sent events are folded into one
    /// accumulated [`ChatResponse`]; `callback` is awaited once per chunk
    /// carrying non-empty content, in arrival order, before the next line is
    /// processed.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any I/O when the request violates a
    /// field domain; otherwise transport failures, non-2xx statuses, and
    /// body/stream errors. A single malformed streamed chunk is skipped, not
    /// an error.
    pub async fn chat_completion(
        &self,
        request: &ChatRequest,
        mut callback: Option<AsyncTokenCallback>,
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

        // Bounds the request phase only: streams already delivering lines
        // are unaffected
        let response = match tokio::time::timeout(self.request_timeout, builder.send()).await {
            Ok(response) => check_status(response?).await?,
            Err(_) => return Err(PerplexityError::Timeout(self.request_timeout.as_secs())),
        };

        if !request.stream {
            return response
                .json()
                .await
                .map_err(|e| PerplexityError::Parse(e.to_string()));
        }

        let mut accumulator = ResponseAccumulator::new();
        let mut events = response.bytes_stream().eventsource();

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| PerplexityError::Stream(e.to_string()))?;
            match accumulator.feed_data(event.data.trim()) {
                LineEvent::Fragment(fragment) => {
                    if let Some(callback) = callback.as_mut() {
                        callback(fragment).await;
                    }
                }
                LineEvent::Done => break,
                LineEvent::Ignored => {}
            }
        }

        Ok(accumulator.into_response())
    }
}

/// Surface a non-success status as an error before the body is interpreted
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    Err(PerplexityError::Api {
        status: status.as_u16(),
        message,
    })
}
