//! Request and response types for the Perplexity chat completions API

pub mod message;
pub mod request;
pub mod response;
pub mod stream;

pub use message::Message;
pub use request::{ChatRequest, ChatRequestBuilder, DEFAULT_MODEL, RecencyFilter};
pub use response::{ChatResponse, ResponseChoice, ResponseMessage, Usage};
pub use stream::{StreamChoice, StreamChunk, StreamDelta};
