//! # Deadline scope handed to `close` and to every cleanup action.
//!
//! A [`Deadline`] is a point in time plus an early-cancel switch, the closest
//! thing to a deadline-bearing context. The drain checks it between cleanup
//! actions; actions are expected to observe it themselves (it never interrupts
//! an action that is already running).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use closer::Deadline;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let deadline = Deadline::after(Duration::from_secs(5));
//! assert!(!deadline.is_expired());
//!
//! deadline.cancel();
//! assert!(deadline.is_expired());
//! deadline.expired().await; // returns immediately
//! # }
//! ```

use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::ShutdownError;

/// Longest distance a deadline is placed from now (about 30 years).
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Bounded-time scope for a shutdown drain.
///
/// Cheap to clone; clones share the cancel switch.
#[derive(Clone, Debug)]
pub struct Deadline {
    at: Instant,
    length: Duration,
    cancel: CancellationToken,
}

impl Deadline {
    /// Deadline `timeout` from now.
    ///
    /// Timeouts beyond about 30 years (`Duration::MAX` included) are clamped.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout.min(FAR_FUTURE),
            length: timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Deadline at a fixed instant.
    pub fn at(at: Instant) -> Self {
        Self {
            at,
            length: at.saturating_duration_since(Instant::now()),
            cancel: CancellationToken::new(),
        }
    }

    /// The instant the scope expires at.
    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left before expiry (`Duration::ZERO` once expired or cancelled).
    pub fn remaining(&self) -> Duration {
        if self.cancel.is_cancelled() {
            return Duration::ZERO;
        }
        self.at.saturating_duration_since(Instant::now())
    }

    /// Expires the scope immediately.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the scope has been cancelled or its instant has passed.
    pub fn is_expired(&self) -> bool {
        self.cancel.is_cancelled() || Instant::now() >= self.at
    }

    /// Completes when the scope expires.
    pub async fn expired(&self) {
        tokio::select! {
            _ = time::sleep_until(self.at) => {}
            _ = self.cancel.cancelled() => {}
        }
    }

    /// The error describing why the scope is over, or `None` while it is live.
    ///
    /// An explicit [`cancel`](Self::cancel) wins over the clock.
    pub fn error(&self) -> Option<ShutdownError> {
        if self.cancel.is_cancelled() {
            Some(ShutdownError::Canceled)
        } else if Instant::now() >= self.at {
            Some(ShutdownError::DeadlineExceeded {
                deadline: self.length,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expires_with_clock() {
        let deadline = Deadline::after(Duration::from_millis(50));
        assert!(deadline.error().is_none());
        assert_eq!(deadline.remaining(), Duration::from_millis(50));

        time::advance(Duration::from_millis(60)).await;

        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
        assert_eq!(
            deadline.error(),
            Some(ShutdownError::DeadlineExceeded {
                deadline: Duration::from_millis(50)
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_wins_over_clock() {
        let deadline = Deadline::after(Duration::from_secs(60));
        let clone = deadline.clone();
        clone.cancel();

        deadline.expired().await;
        assert_eq!(deadline.error(), Some(ShutdownError::Canceled));
    }

    #[tokio::test]
    async fn test_unbounded_timeout_is_clamped() {
        let deadline = Deadline::after(Duration::MAX);
        assert!(deadline.error().is_none());
        assert!(deadline.remaining() > Duration::from_secs(86_400 * 365));
        assert!(deadline.remaining() <= FAR_FUTURE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_waits_for_instant() {
        let deadline = Deadline::at(Instant::now() + Duration::from_secs(1));
        let start = Instant::now();
        deadline.expired().await;
        assert!(start.elapsed() >= Duration::from_secs(1));
    }
}
