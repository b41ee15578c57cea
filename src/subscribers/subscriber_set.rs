//! # Panic-isolated fan-out to multiple sinks.
//!
//! Provides [`SubscriberSet`] — a composite sink that hands each event to every
//! member in registration order.
//!
//! ## Architecture
//! ```text
//! on_event(event)
//!     │
//!     ├──► sink1.on_event()
//!     │         └──────► panic → SubscriberPanicked to the other sinks
//!     ├──► sink2.on_event()
//!     └──► sinkN.on_event()
//! ```
//!
//! ## Rules
//! - **Ordered**: members see events in the order the coordinator emits them
//! - **Isolation**: a panicking member is skipped for that event; the others still see it
//!
//! **Warning**: `AssertUnwindSafe` is used, which can leave shared state inconsistent
//! if a sink uses `Arc<Mutex<T>>` and panics while holding the lock.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use closer::{Discard, LogWriter, Subscribe, SubscriberSet};
//!
//! let sinks: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new()), Arc::new(Discard)];
//! let set = SubscriberSet::new(sinks);
//! assert_eq!(set.len(), 2);
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::error::panic_message;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Composite sink over several [`Subscribe`] implementations.
#[derive(Clone, Default)]
pub struct SubscriberSet {
    subs: Vec<Arc<dyn Subscribe>>,
}

impl SubscriberSet {
    /// Creates a set from the given sinks.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        Self { subs }
    }

    /// Number of member sinks.
    pub fn len(&self) -> usize {
        self.subs.len()
    }

    /// Whether the set has no members.
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }

    /// Delivers `event` to every member except the one at `skip`.
    ///
    /// Returns the panic report of each member that panicked.
    async fn deliver(&self, event: &Event, skip: Option<usize>) -> Vec<(usize, Event)> {
        let mut panicked = Vec::new();
        for (i, sub) in self.subs.iter().enumerate() {
            if skip == Some(i) {
                continue;
            }
            let fut = sub.on_event(event);
            if let Err(panic_err) = AssertUnwindSafe(fut).catch_unwind().await {
                let info = panic_message(&*panic_err);
                panicked.push((i, Event::subscriber_panicked(sub.name(), info)));
            }
        }
        panicked
    }
}

#[async_trait]
impl Subscribe for SubscriberSet {
    async fn on_event(&self, event: &Event) {
        for (culprit, report) in self.deliver(event, None).await {
            // Reports are delivered once; a panic while reporting is swallowed.
            let _ = self.deliver(&report, Some(culprit)).await;
        }
    }

    fn name(&self) -> &'static str {
        "SubscriberSet"
    }
}
