use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A set-once flag the caller fires to stop waiting on an in-progress send.
///
/// Cancellation stops the dispatch engine's wait, not the attempts
/// themselves: deliveries already in flight are abandoned rather than
/// interrupted, and their results are discarded. Clones share the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> CancelToken {
        Default::default()
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
