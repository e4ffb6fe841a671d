#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

//! Typed Rust client for the Perplexity chat completions API
//!
//! Builds validated requests, sends them from async or blocking code, and
//! returns both whole-body and streamed responses as one accumulated
//! [`ChatResponse`], optionally notifying a per-token callback as fragments
//! arrive.
//!
//! ```no_run
//! use futures_util::FutureExt;
//! use perplexity_client::{ChatRequest, Message, PerplexityClient};
//!
//! # async fn run() -> perplexity_client::Result<()> {
//! let client = PerplexityClient::new(None)?;
//! let request = ChatRequest::new(vec![Message::user("What is Kamiwaza.AI?")]);
//!
//! let response = client
//!     .chat_completion(
//!         &request,
//!         Some(Box::new(|token: String| {
//!             async move { print!("{token}") }.boxed()
//!         })),
//!     )
//!     .await?;
//!
//! println!("{:?}", response.text());
//! # Ok(())
//! # }
//! ```

pub mod accumulate;
pub mod auth;
pub mod blocking;
pub mod callback;
mod client;
pub mod error;
pub mod types;

pub use accumulate::{LineEvent, ResponseAccumulator};
pub use auth::API_KEY_ENV;
pub use callback::{AsyncTokenCallback, SyncTokenCallback, TokenCallback};
pub use client::{DEFAULT_BASE_URL, PerplexityClient};
pub use error::{PerplexityError, Result};
pub use types::{
    ChatRequest, ChatRequestBuilder, ChatResponse, Message, RecencyFilter, ResponseChoice, Usage,
};
