//! # Lifecycle events emitted by the coordinator.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Drain events**: the cleanup stack being run (starting, per-closer outcome, completion)
//! - **Dependency events**: start/end of cleanups registered with a name
//! - **Trigger events**: what initiated the shutdown (signal, task failure)
//! - **Sink events**: problems inside the logging sinks themselves
//!
//! The [`Event`] struct carries additional metadata such as timestamps, source
//! labels, durations and error messages.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use closer::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::CloserFailed)
//!     .with_source("db.rs:42")
//!     .with_error("connection reset")
//!     .with_duration(Duration::from_millis(12));
//!
//! assert_eq!(ev.kind, EventKind::CloserFailed);
//! assert_eq!(ev.kind.message(), "closer returned error");
//! assert_eq!(ev.source.as_deref(), Some("db.rs:42"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Drain events ===
    /// Drain is about to run the cleanup stack.
    ///
    /// Sets:
    /// - `count`: number of cleanups to run
    /// - `global`: whether this is the process-wide coordinator
    ShutdownStarting,

    /// Shutdown began with an empty cleanup stack.
    ///
    /// Sets:
    /// - `global`
    NothingToClose,

    /// A cleanup returned successfully.
    ///
    /// Sets:
    /// - `source`: registration site
    /// - `duration`: time spent in the cleanup
    CloserCompleted,

    /// A cleanup returned an error.
    ///
    /// Sets:
    /// - `source`: registration site
    /// - `duration`: time spent in the cleanup
    /// - `error`: error message
    CloserFailed,

    /// A cleanup panicked; the drain moved on to the next entry.
    ///
    /// Sets:
    /// - `index`: position in drain order
    /// - `panic`: panic payload
    /// - `source`: registration site
    CloserPanicked,

    /// Drain finished and no error was recorded.
    ShutdownCompleted,

    /// Drain finished with a recorded first error.
    ///
    /// Sets:
    /// - `error`: the first error
    ShutdownFailed,

    /// The deadline scope expired; remaining cleanups are abandoned.
    ///
    /// Sets:
    /// - `error`: deadline error message
    DeadlineHit,

    // === Dependency events (named cleanups) ===
    /// A named cleanup is starting.
    ///
    /// Sets:
    /// - `name`, `source`
    DependencyClosing,

    /// A named cleanup finished successfully.
    ///
    /// Sets:
    /// - `name`, `source`, `duration`
    DependencyClosed,

    /// A named cleanup returned an error.
    ///
    /// Sets:
    /// - `name`, `source`, `duration`, `error`
    DependencyFailed,

    // === Trigger events ===
    /// A watched OS signal arrived.
    ///
    /// Sets:
    /// - `signal`: signal name
    SignalReceived,

    /// A task body returned an error.
    ///
    /// Sets:
    /// - `error`: error message
    TaskFailed,

    /// A task body panicked.
    ///
    /// Sets:
    /// - `panic`: panic payload
    TaskPanicked,

    // === Sink events ===
    /// A sink inside a `SubscriberSet` panicked while handling an event.
    ///
    /// Sets:
    /// - `name`: sink name
    /// - `panic`: panic payload
    SubscriberPanicked,
}

impl EventKind {
    /// Stable log message for this kind.
    pub fn message(&self) -> &'static str {
        match self {
            EventKind::ShutdownStarting => "starting graceful shutdown",
            EventKind::NothingToClose => "no resources to close",
            EventKind::CloserCompleted => "closer completed",
            EventKind::CloserFailed => "closer returned error",
            EventKind::CloserPanicked => "panic recovered in closer",
            EventKind::ShutdownCompleted => "graceful shutdown completed successfully",
            EventKind::ShutdownFailed => "graceful shutdown completed with errors",
            EventKind::DeadlineHit => "shutdown context canceled",
            EventKind::DependencyClosing => "closing dependency start",
            EventKind::DependencyClosed => "closing dependency done",
            EventKind::DependencyFailed => "closing dependency failed",
            EventKind::SignalReceived => "signal received, initiating shutdown",
            EventKind::TaskFailed => "task returned error, initiating shutdown",
            EventKind::TaskPanicked => "panic recovered in task, initiating shutdown",
            EventKind::SubscriberPanicked => "panic recovered in log subscriber",
        }
    }
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Registration site of the cleanup involved.
    pub source: Option<Arc<str>>,
    /// Human name of a named cleanup or sink.
    pub name: Option<Arc<str>>,
    /// Error message.
    pub error: Option<Arc<str>>,
    /// Panic payload rendered as text.
    pub panic: Option<Arc<str>>,
    /// Signal name.
    pub signal: Option<&'static str>,
    /// Time spent in a cleanup.
    pub duration: Option<Duration>,
    /// Position of a cleanup in drain order.
    pub index: Option<usize>,
    /// Number of cleanups in the drain.
    pub count: Option<usize>,
    /// Whether the emitting coordinator is the process-wide one.
    pub global: bool,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            source: None,
            name: None,
            error: None,
            panic: None,
            signal: None,
            duration: None,
            index: None,
            count: None,
            global: false,
        }
    }

    /// Attaches a cleanup source label.
    #[inline]
    pub fn with_source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attaches a cleanup (or sink) name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches an error message.
    #[inline]
    pub fn with_error(mut self, error: impl Into<Arc<str>>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Attaches a panic payload.
    #[inline]
    pub fn with_panic(mut self, panic: impl Into<Arc<str>>) -> Self {
        self.panic = Some(panic.into());
        self
    }

    #[inline]
    pub fn with_signal(mut self, signal: &'static str) -> Self {
        self.signal = Some(signal);
        self
    }

    #[inline]
    pub fn with_duration(mut self, d: Duration) -> Self {
        self.duration = Some(d);
        self
    }

    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Marks the event as coming from the process-wide coordinator.
    #[inline]
    pub fn with_global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    /// Creates a sink panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_panic(info)
    }

    /// Shorthand for `self.kind.message()`.
    #[inline]
    pub fn message(&self) -> &'static str {
        self.kind.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_is_monotonic() {
        let a = Event::new(EventKind::ShutdownStarting);
        let b = Event::new(EventKind::ShutdownCompleted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_builders_fill_fields() {
        let ev = Event::new(EventKind::CloserPanicked)
            .with_index(2)
            .with_panic("boom")
            .with_source("pool.rs:7")
            .with_global(true);
        assert_eq!(ev.index, Some(2));
        assert_eq!(ev.panic.as_deref(), Some("boom"));
        assert_eq!(ev.source.as_deref(), Some("pool.rs:7"));
        assert!(ev.global);
        assert_eq!(ev.message(), "panic recovered in closer");
    }

    #[test]
    fn test_messages_are_stable() {
        assert_eq!(EventKind::NothingToClose.message(), "no resources to close");
        assert_eq!(
            EventKind::ShutdownFailed.message(),
            "graceful shutdown completed with errors"
        );
        assert_eq!(
            EventKind::SignalReceived.message(),
            "signal received, initiating shutdown"
        );
    }
}
