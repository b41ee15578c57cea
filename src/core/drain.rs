//! # Shutdown gate and LIFO drain.
//!
//! [`Inner::close`] is the single entry point for every shutdown trigger. The
//! first caller flips the `started` gate and spawns the drain; every caller,
//! first or not, then waits on the `done` latch and reads the stored first
//! error.
//!
//! The drain runs detached from the caller, so a caller that stops polling
//! (a `select!` branch losing, a dropped future) never leaves the other callers
//! waiting on a half-finished shutdown.
//!
//! ## Drain
//! ```text
//! root.cancel()
//! entries = stack.drain_reverse()           (sealed: later registrations dropped)
//! entries.is_empty()? → NothingToClose → done
//! ShutdownStarting{count}
//! for (i, entry) in entries:
//!     deadline.error()? → DeadlineHit, first_error ← err, stop
//!     entry.call(deadline) under catch_unwind
//!         Ok      → CloserCompleted{duration, source}
//!         Err(e)  → CloserFailed{duration, source, error};   first_error ← e
//!         panic   → CloserPanicked{index, source, panic};    first_error ← panic
//! ShutdownCompleted | ShutdownFailed{error}
//! done.release()                            (also on unwind)
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::FutureExt;
use tokio::time::Instant;

use super::closer::Inner;
use super::deadline::Deadline;
use crate::error::{ShutdownError, panic_message};
use crate::events::{Event, EventKind};

impl Inner {
    /// Runs the shutdown once and waits for it; every call returns the same result.
    pub(crate) async fn close(self: &Arc<Self>, deadline: Deadline) -> Result<(), ShutdownError> {
        if !self.started.swap(true, Ordering::AcqRel) {
            let inner = Arc::clone(self);
            tokio::spawn(async move { inner.drain(deadline).await });
        }
        self.done.wait().await;
        self.result()
    }

    async fn drain(&self, deadline: Deadline) {
        let _done = self.done.release_on_drop();
        self.root.cancel();

        let entries = self.cleanups.drain_reverse();
        if entries.is_empty() {
            self.sink.emit(Event::new(EventKind::NothingToClose)).await;
            return;
        }

        self.sink
            .emit(Event::new(EventKind::ShutdownStarting).with_count(entries.len()))
            .await;

        for (index, entry) in entries.into_iter().enumerate() {
            if let Some(err) = deadline.error() {
                self.sink
                    .emit(Event::new(EventKind::DeadlineHit).with_error(err.to_string()))
                    .await;
                self.set_first_err(err);
                break;
            }

            let started = Instant::now();
            let outcome = AssertUnwindSafe(entry.action.call(deadline.clone()))
                .catch_unwind()
                .await;
            let took = started.elapsed();

            let mut event = match outcome {
                Ok(Ok(())) => Event::new(EventKind::CloserCompleted).with_duration(took),
                Ok(Err(error)) => {
                    let event = Event::new(EventKind::CloserFailed)
                        .with_duration(took)
                        .with_error(error.to_string());
                    self.set_first_err(ShutdownError::Cleanup {
                        origin: entry.source.to_string(),
                        error,
                    });
                    event
                }
                Err(panic) => {
                    let panic = panic_message(&*panic);
                    let event = Event::new(EventKind::CloserPanicked)
                        .with_index(index)
                        .with_panic(panic.as_str());
                    self.set_first_err(ShutdownError::CleanupPanicked {
                        index,
                        origin: entry.source.to_string(),
                        panic,
                    });
                    event
                }
            };
            event = event.with_source(Arc::clone(&entry.source));
            if let Some(name) = &entry.name {
                event = event.with_name(Arc::clone(name));
            }
            self.sink.emit(event).await;
        }

        let summary = match self.first_error.get() {
            None => Event::new(EventKind::ShutdownCompleted),
            Some(err) => Event::new(EventKind::ShutdownFailed).with_error(err.to_string()),
        };
        self.sink.emit(summary).await;
    }
}
