//! # LogWriter — `tracing` sink
//!
//! The default sink. Every [`Event`] becomes one `tracing` event with the
//! stable message of its [`EventKind`] and structured fields.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  starting graceful shutdown count=3 global=false
//! INFO  closer completed duration=1.2ms source="cache.rs:40"
//! ERROR closer returned error duration=3ms source="db.rs:12" error="connection reset"
//! ERROR panic recovered in closer index=2 panic="boom" source="main.rs:9"
//! ERROR graceful shutdown completed with errors error="connection reset"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const UNKNOWN: &str = "unknown";

/// `tracing`-backed event writer.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let msg = e.message();
        let source = e.source.as_deref().unwrap_or(UNKNOWN);
        let name = e.name.as_deref().unwrap_or(UNKNOWN);
        let error = e.error.as_deref().unwrap_or_default();
        let duration = e.duration.unwrap_or_default();

        match e.kind {
            EventKind::ShutdownStarting => {
                tracing::info!(count = e.count.unwrap_or_default(), global = e.global, "{msg}");
            }
            EventKind::NothingToClose => {
                tracing::info!(global = e.global, "{msg}");
            }
            EventKind::CloserCompleted => {
                tracing::info!(?duration, source, "{msg}");
            }
            EventKind::CloserFailed => {
                tracing::error!(?duration, error, source, "{msg}");
            }
            EventKind::CloserPanicked => {
                tracing::error!(
                    index = e.index.unwrap_or_default(),
                    panic = e.panic.as_deref().unwrap_or(UNKNOWN),
                    source,
                    "{msg}"
                );
            }
            EventKind::ShutdownCompleted => {
                tracing::info!(global = e.global, "{msg}");
            }
            EventKind::ShutdownFailed => {
                tracing::error!(error, global = e.global, "{msg}");
            }
            EventKind::DeadlineHit => {
                tracing::warn!(error, "{msg}");
            }
            EventKind::DependencyClosing => {
                tracing::info!(dependency = name, source, "{msg}");
            }
            EventKind::DependencyClosed => {
                tracing::info!(dependency = name, source, ?duration, "{msg}");
            }
            EventKind::DependencyFailed => {
                tracing::error!(dependency = name, source, ?duration, error, "{msg}");
            }
            EventKind::SignalReceived => {
                tracing::info!(signal = e.signal.unwrap_or(UNKNOWN), "{msg}");
            }
            EventKind::TaskFailed => {
                tracing::error!(error, "{msg}");
            }
            EventKind::TaskPanicked => {
                tracing::error!(panic = e.panic.as_deref().unwrap_or(UNKNOWN), "{msg}");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(
                    subscriber = name,
                    panic = e.panic.as_deref().unwrap_or(UNKNOWN),
                    "{msg}"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
