//! Token callback types and dispatch modes
//!
//! The concurrency mode is explicit in the callback type rather than being
//! detected at runtime:
//!
//! - blocking call + [`TokenCallback::Sync`]: invoked inline on the calling
//!   thread between lines;
//! - blocking call + [`TokenCallback::Async`]: bridged fire-and-forget onto
//!   a running tokio runtime when one is available, otherwise executed on a
//!   transient single-use runtime (see [`TokenCallback::notify`]);
//! - async call + [`AsyncTokenCallback`]: awaited per fragment, so each
//!   callback completes before the next line is processed.

use futures::future::BoxFuture;

/// Synchronous per-fragment callback
pub type SyncTokenCallback = Box<dyn FnMut(&str) + Send>;

/// Asynchronous per-fragment callback
pub type AsyncTokenCallback = Box<dyn FnMut(String) -> BoxFuture<'static, ()> + Send>;

/// Per-fragment callback accepted by the blocking client
pub enum TokenCallback {
    /// Runs inline on the calling thread
    Sync(SyncTokenCallback),
    /// Bridged onto a tokio runtime, fire-and-forget
    Async(AsyncTokenCallback),
}

impl TokenCallback {
    /// Wrap a synchronous closure
    pub fn sync(callback: impl FnMut(&str) + Send + 'static) -> Self {
        Self::Sync(Box::new(callback))
    }

    /// Wrap an asynchronous closure
    pub fn r#async(
        callback: impl FnMut(String) -> BoxFuture<'static, ()> + Send + 'static,
    ) -> Self {
        Self::Async(Box::new(callback))
    }

    /// Notify the callback of one fragment from a blocking context
    ///
    /// Async callbacks are spawned onto the current tokio runtime when the
    /// calling thread has one (completion is not awaited; invocations start
    /// in fragment arrival order). Without a runtime, a transient
    /// current-thread runtime executes the single invocation to completion
    /// and is dropped afterwards. Notification is best-effort: a runtime
    /// construction failure drops the fragment with a warning instead of
    /// failing the call.
    pub(crate) fn notify(&mut self, fragment: &str) {
        match self {
            Self::Sync(callback) => callback(fragment),
            Self::Async(callback) => {
                let future = callback(fragment.to_owned());
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        let _task = handle.spawn(future);
                    }
                    Err(_) => match tokio::runtime::Builder::new_current_thread().build() {
                        Ok(runtime) => runtime.block_on(future),
                        Err(error) => {
                            tracing::warn!(%error, "failed to build runtime for async token callback");
                        }
                    },
                }
            }
        }
    }
}

impl std::fmt::Debug for TokenCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync(_) => f.write_str("TokenCallback::Sync"),
            Self::Async(_) => f.write_str("TokenCallback::Async"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use futures_util::FutureExt;

    use super::*;

    #[test]
    fn sync_callback_runs_inline() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut callback = TokenCallback::sync(move |fragment: &str| {
            sink.lock().unwrap().push(fragment.to_owned());
        });

        callback.notify("a");
        callback.notify("b");

        assert_eq!(*seen.lock().unwrap(), ["a", "b"]);
    }

    #[test]
    fn async_callback_without_runtime_uses_transient_runtime() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut callback = TokenCallback::r#async(move |fragment: String| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(fragment);
            }
            .boxed()
        });

        // No tokio runtime on this thread: each invocation completes before
        // notify returns
        callback.notify("x");
        callback.notify("y");

        assert_eq!(*seen.lock().unwrap(), ["x", "y"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn async_callback_on_running_runtime_is_spawned() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let (done_tx, mut done_rx) = tokio::sync::mpsc::unbounded_channel();

        let mut callback = TokenCallback::r#async(move |fragment: String| {
            let sink = Arc::clone(&sink);
            let done_tx = done_tx.clone();
            async move {
                sink.lock().unwrap().push(fragment);
                done_tx.send(()).ok();
            }
            .boxed()
        });

        // Fire-and-forget: notify returns without awaiting completion, so
        // wait for both spawned invocations to land
        callback.notify("x");
        callback.notify("y");
        done_rx.recv().await.unwrap();
        done_rx.recv().await.unwrap();

        let mut fragments = seen.lock().unwrap().clone();
        fragments.sort();
        assert_eq!(fragments, ["x", "y"]);
    }
}
