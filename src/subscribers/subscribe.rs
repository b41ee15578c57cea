//! # Core sink trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into the
//! coordinator: structured loggers, metrics, test recorders.
//!
//! ## Contract
//! - Events are delivered **inline**: the drain awaits `on_event` before running
//!   the next cleanup, so the log narrative is in order. Keep handlers short.
//! - A handler must not call back into the coordinator's `close`/`wait`.
//!
//! ## Example
//! ```rust
//! use closer::{Event, EventKind, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::CloserFailed {
//!             // write audit record...
//!         }
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event sinks.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}
