//! # Logging sinks for the closer runtime.
//!
//! The coordinator narrates every shutdown as a stream of [`Event`](crate::Event)s
//! handed to a single sink. This module provides the [`Subscribe`] trait (the
//! extension point) and the built-in sinks.
//!
//! ## Architecture
//! ```text
//! Drain / TaskSupervisor / SignalWatcher
//!        │
//!        └──► sink.on_event(&Event)      (the sink installed on the Closer)
//!                  │
//!                  ├──► LogWriter        (tracing, default)
//!                  ├──► Discard          (silent)
//!                  └──► SubscriberSet ──► sink 1, sink 2, ... (panic-isolated)
//! ```
//!
//! The sink can be swapped at any time with [`Closer::set_logger`](crate::Closer::set_logger).

mod embedded;
mod subscribe;
mod subscriber_set;

pub use embedded::{Discard, LogWriter};
pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;
