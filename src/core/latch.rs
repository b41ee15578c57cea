//! # One-shot, multi-observer latch.
//!
//! A [`Latch`] starts closed and is released exactly once; every clone observes
//! the release, including waiters that arrive after it happened. Backs the
//! coordinator's `done` signal and the per-task `started` signal.

use tokio_util::sync::{CancellationToken, DropGuard};

/// Latched one-shot signal.
///
/// Cheap to clone; all clones share the same state.
#[derive(Clone, Debug, Default)]
pub(crate) struct Latch {
    token: CancellationToken,
}

impl Latch {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Releases the latch. Idempotent.
    pub(crate) fn release(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Completes once the latch has been released.
    pub(crate) async fn wait(&self) {
        self.token.cancelled().await;
    }

    /// Returns a guard that releases the latch when dropped (return or unwind).
    pub(crate) fn release_on_drop(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_late_waiter_sees_release() {
        let latch = Latch::new();
        assert!(!latch.is_released());

        latch.release();
        latch.release();

        latch.clone().wait().await;
        assert!(latch.is_released());
    }

    #[tokio::test]
    async fn test_guard_releases_on_drop() {
        let latch = Latch::new();
        {
            let _guard = latch.release_on_drop();
            assert!(!latch.is_released());
        }
        assert!(latch.is_released());
    }
}
