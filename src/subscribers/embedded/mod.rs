//! # Built-in sinks
//!
//! - [`LogWriter`]: forwards events to `tracing` with structured fields (default sink).
//! - [`Discard`]: drops every event.

mod discard;
mod log;

pub use discard::Discard;
pub use log::LogWriter;
