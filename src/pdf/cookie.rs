//! Cancellation and progress signal for long traversals

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared flag checked by the serializer between objects.
///
/// Clones share state, so one clone can be handed to another thread that
/// requests the abort while the traversal holds the other.
#[derive(Clone, Debug, Default)]
pub struct Cookie {
    abort: Arc<AtomicBool>,
    progress: Arc<AtomicUsize>,
}

impl Cookie {
    /// Fresh cookie with no progress and no abort request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the current traversal stop.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Whether an abort has been requested.
    pub fn should_abort(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }

    /// Clear a pending abort request.
    pub fn reset_abort(&self) {
        self.abort.store(false, Ordering::Relaxed);
    }

    /// Objects visited so far.
    pub fn progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    pub(crate) fn inc_progress(&self) {
        self.progress.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let cookie = Cookie::new();
        let remote = cookie.clone();
        assert!(!cookie.should_abort());
        remote.abort();
        assert!(cookie.should_abort());
        cookie.reset_abort();
        assert!(!remote.should_abort());

        remote.inc_progress();
        assert_eq!(cookie.progress(), 1);
    }
}
