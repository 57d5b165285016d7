//! Debounce and throttle wrappers for callbacks
//!
//! Both wrappers are fire-and-forget: the wrapped callback's work is never
//! handed back to the caller. Timing is measured with `tokio::time`, so a
//! paused test clock drives them deterministically.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Delays a callback until calls stop arriving for `wait`
///
/// Each `call` cancels the pending invocation, if any, and schedules a new one
/// with the latest arguments. Only the last call of a burst fires. Calling
/// requires a running tokio runtime.
pub struct Debounce<A> {
    callback: Arc<dyn Fn(A) + Send + Sync>,
    wait: Duration,
    pending: Option<JoinHandle<()>>,
}

impl<A> Debounce<A>
where
    A: Send + 'static,
{
    pub fn new<F>(callback: F, wait: Duration) -> Self
    where
        F: Fn(A) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            wait,
            pending: None,
        }
    }

    /// Schedules the callback `wait` from now with `args`, replacing any pending call
    pub fn call(&mut self, args: A) {
        self.cancel();

        let callback = Arc::clone(&self.callback);
        let wait = self.wait;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            callback(args);
        }));
    }

    /// Whether an invocation is scheduled and has not run yet
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<A> Debounce<A> {
    /// Drops the scheduled invocation without running it
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl<A> Drop for Debounce<A> {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Runs a callback at most once per `limit`, on the leading edge
///
/// The first call fires immediately and opens a window of length `limit`.
/// Calls inside the window are dropped. The first call after it closes fires
/// and opens a new window.
pub struct Throttle<A> {
    callback: Box<dyn FnMut(A) + Send>,
    limit: Duration,
    window_start: Option<Instant>,
}

impl<A> Throttle<A> {
    pub fn new<F>(callback: F, limit: Duration) -> Self
    where
        F: FnMut(A) + Send + 'static,
    {
        Self {
            callback: Box::new(callback),
            limit,
            window_start: None,
        }
    }

    /// Invokes the callback unless a window is open
    ///
    /// # Returns
    /// `true` if the callback ran, `false` if the call was dropped
    pub fn call(&mut self, args: A) -> bool {
        let now = Instant::now();
        if let Some(start) = self.window_start {
            if now < start + self.limit {
                return false;
            }
        }

        self.window_start = Some(now);
        (self.callback)(args);
        true
    }
}
