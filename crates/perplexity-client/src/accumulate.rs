//! Streaming response accumulator
//!
//! Folds a sequence of server-sent-event lines into a single
//! [`ChatResponse`], as if the call had not been streamed. Both call paths
//! (async and blocking) drive the same state machine; they only differ in
//! how lines reach it and how the token callback is dispatched.

use crate::types::response::ChatResponse;
use crate::types::stream::StreamChunk;

/// SSE payload prefix
const DATA_PREFIX: &str = "data: ";

/// End-of-stream sentinel
const DONE_SENTINEL: &str = "[DONE]";

/// Outcome of feeding one line (or payload) to the accumulator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// Nothing to report: keep-alive, comment, empty delta, or a skipped
    /// malformed chunk
    Ignored,
    /// A non-empty content fragment was extracted and appended
    Fragment(String),
    /// The `[DONE]` sentinel was seen; no further lines are processed
    Done,
}

/// Builds one accumulated [`ChatResponse`] from streamed chunks
///
/// Merge rules per chunk:
/// - top-level `id`, `object`, `created`, `model`, `citations` overwrite the
///   accumulated values (later chunks win);
/// - `choices[0].delta.content` is appended to both `message.content` and
///   `delta.content` of the single accumulated choice;
/// - a non-null `finish_reason` overwrites the accumulated one and is never
///   cleared by later chunks that omit it;
/// - `usage` is replaced wholesale, last occurrence wins.
///
/// A malformed chunk is logged and skipped; it never aborts the stream.
#[derive(Debug)]
pub struct ResponseAccumulator {
    response: ChatResponse,
}

impl ResponseAccumulator {
    /// Create an accumulator holding the empty response skeleton
    pub fn new() -> Self {
        Self {
            response: ChatResponse::skeleton(),
        }
    }

    /// Feed one raw line from the event stream
    ///
    /// Blank lines and lines without the `data: ` prefix (keep-alives,
    /// comments) are ignored.
    pub fn feed_line(&mut self, line: &str) -> LineEvent {
        let line = line.trim();
        match line.strip_prefix(DATA_PREFIX) {
            Some(payload) => self.feed_data(payload),
            None => LineEvent::Ignored,
        }
    }

    /// Feed one event payload with the `data: ` prefix already stripped
    pub fn feed_data(&mut self, data: &str) -> LineEvent {
        if data == DONE_SENTINEL {
            return LineEvent::Done;
        }

        match serde_json::from_str::<StreamChunk>(data) {
            Ok(chunk) => self.merge_chunk(chunk),
            Err(error) => {
                // Non-fatal: skip the chunk and keep consuming
                tracing::debug!(%error, data, "failed to parse JSON from stream");
                LineEvent::Ignored
            }
        }
    }

    /// Finish accumulation and return the merged response
    ///
    /// Valid both after `[DONE]` and on plain exhaustion of the line source.
    pub fn into_response(self) -> ChatResponse {
        self.response
    }

    fn merge_chunk(&mut self, chunk: StreamChunk) -> LineEvent {
        if let Some(id) = chunk.id {
            self.response.id = Some(id);
        }
        if let Some(object) = chunk.object {
            self.response.object = object;
        }
        if let Some(created) = chunk.created {
            self.response.created = Some(created);
        }
        if let Some(model) = chunk.model {
            self.response.model = Some(model);
        }
        if let Some(citations) = chunk.citations {
            self.response.citations = Some(citations);
        }
        if let Some(usage) = chunk.usage {
            self.response.usage = usage;
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            return LineEvent::Ignored;
        };

        let fragment = choice.delta.content.unwrap_or_default();
        let accumulated = &mut self.response.choices[0];
        accumulated.message.content.push_str(&fragment);
        // Deliberately mirrored: delta holds the full transcript too
        accumulated.delta.content.push_str(&fragment);

        if let Some(reason) = choice.finish_reason {
            accumulated.finish_reason = Some(reason);
        }

        if fragment.is_empty() {
            LineEvent::Ignored
        } else {
            LineEvent::Fragment(fragment)
        }
    }
}

impl Default for ResponseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
