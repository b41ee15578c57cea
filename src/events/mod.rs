//! Lifecycle events: the structured narrative of a shutdown.
//!
//! This module holds the event **data model** emitted by the coordinator, the
//! task supervisor, the signal watcher and the cleanup drain. Events are handed
//! to the coordinator's sink (any [`Subscribe`](crate::Subscribe) implementation).
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//!
//! ## Quick reference
//! - **Publishers**: the drain (`ShutdownStarting` … `ShutdownCompleted`),
//!   named cleanups (`Dependency*`), the task supervisor (`Task*`), the signal
//!   watcher (`SignalReceived`), `SubscriberSet` (`SubscriberPanicked`).
//! - **Consumers**: the installed sink, by default [`LogWriter`](crate::LogWriter).

mod event;

pub use event::{Event, EventKind};
