//! # Coordinator configuration.
//!
//! Provides [`Config`], the settings a [`Closer`](crate::Closer) is built from.
//!
//! ## Sentinel values
//! - `signals = []` → no signal watcher is installed

use std::time::Duration;

use serde::Deserialize;

use super::signals::Signal;

/// Default length of the deadline used when shutdown is initiated internally
/// (signal delivery, task failure, `wait` completion).
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for a coordinator.
///
/// ## Field semantics
/// - `shutdown_timeout`: drain deadline for internally initiated shutdowns
/// - `signals`: OS signals that trigger shutdown (`[]` = do not watch signals)
///
/// Deserializable so it can be embedded in an application config file:
/// ```yaml
/// shutdown_timeout_ms: 10000
/// signals: [interrupt, terminate, hangup]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Drain deadline used when shutdown is initiated by a signal, a failing
    /// task, or `wait` noticing that every task has returned.
    ///
    /// Explicit `close` calls bring their own deadline.
    #[serde(rename = "shutdown_timeout_ms", with = "millis")]
    pub shutdown_timeout: Duration,

    /// Signals that trigger shutdown on first delivery.
    pub signals: Vec<Signal>,
}

impl Config {
    /// Whether a signal watcher should be installed.
    #[inline]
    pub fn watches_signals(&self) -> bool {
        !self.signals.is_empty()
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `shutdown_timeout = 5s`
    /// - `signals = [Interrupt, Terminate]`
    fn default() -> Self {
        Self {
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            signals: Signal::defaults().to_vec(),
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
