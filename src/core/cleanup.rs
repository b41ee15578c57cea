//! # Cleanup stack: ordered storage of cleanup actions and a one-shot drain.
//!
//! Entries are appended in registration order and handed back **reversed** by
//! [`CleanupStack::drain_reverse`], which also seals the stack: anything
//! registered after the drain started is dropped and can never influence that
//! shutdown.
//!
//! ## Rules
//! - Stable LIFO: a batch registered by one call keeps its given order before reversal
//! - The lock is held only to push or to swap the vector out
//! - `drain_reverse` runs at most once per coordinator (the shutdown gate guarantees it)

use std::fmt;
use std::future::Future;
use std::panic::Location;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::time::Instant;

use super::deadline::Deadline;
use super::sink::SinkSlot;
use crate::error::TaskError;
use crate::events::{Event, EventKind};

/// Boxed future returned by a cleanup action.
pub type CloseFuture = BoxFuture<'static, Result<(), TaskError>>;

/// A cleanup action: called once with the drain's [`Deadline`].
///
/// Build one with [`CloseFn::new`] when registering several actions in one call
/// through [`Closer::to_close_all`](crate::Closer::to_close_all).
pub struct CloseFn {
    f: Box<dyn FnOnce(Deadline) -> CloseFuture + Send>,
}

impl CloseFn {
    /// Wraps an async cleanup.
    ///
    /// The closure itself runs when the drain polls the action, so a panic in its
    /// synchronous part is contained like a panic in the future.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Deadline) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        Self {
            f: Box::new(move |deadline| Box::pin(async move { f(deadline).await })),
        }
    }

    /// Wraps a cleanup that does its work synchronously (e.g. flushing a file).
    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), TaskError> + Send + 'static,
    {
        Self::new(move |_deadline| async move { f() })
    }

    pub(crate) fn call(self, deadline: Deadline) -> CloseFuture {
        (self.f)(deadline)
    }

    /// Wraps `self` so each run reports start/end through the coordinator's sink.
    pub(crate) fn named(self, name: Arc<str>, source: Arc<str>, sink: Arc<SinkSlot>) -> Self {
        Self::new(move |deadline| async move {
            let start = Instant::now();
            sink.emit(
                Event::new(EventKind::DependencyClosing)
                    .with_name(Arc::clone(&name))
                    .with_source(Arc::clone(&source)),
            )
            .await;

            let res = self.call(deadline).await;
            let elapsed: Duration = start.elapsed();

            let ev = match &res {
                Ok(()) => Event::new(EventKind::DependencyClosed),
                Err(e) => Event::new(EventKind::DependencyFailed).with_error(e.to_string()),
            };
            sink.emit(ev.with_name(name).with_source(source).with_duration(elapsed))
                .await;
            res
        })
    }
}

impl fmt::Debug for CloseFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseFn").finish_non_exhaustive()
    }
}

/// One registered cleanup.
#[derive(Debug)]
pub(crate) struct CloseEntry {
    pub(crate) action: CloseFn,
    pub(crate) source: Arc<str>,
    pub(crate) name: Option<Arc<str>>,
}

#[derive(Default)]
struct StackState {
    entries: Vec<CloseEntry>,
    sealed: bool,
}

/// Append-only stack of cleanups, drained once in reverse.
#[derive(Default)]
pub(crate) struct CleanupStack {
    state: Mutex<StackState>,
}

impl CleanupStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends entries in the given order.
    ///
    /// Returns `false` (and drops the entries) when the stack was already drained.
    pub(crate) fn register(&self, entries: impl IntoIterator<Item = CloseEntry>) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.sealed {
            return false;
        }
        state.entries.extend(entries);
        true
    }

    /// Snapshots and clears the stack, sealing it, and returns the entries newest first.
    pub(crate) fn drain_reverse(&self) -> Vec<CloseEntry> {
        let mut entries = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.sealed = true;
            std::mem::take(&mut state.entries)
        };
        entries.reverse();
        entries
    }

    pub(crate) fn len(&self) -> usize {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}

/// Diagnostic label for a registration site: `file.rs:line`, or `"unknown"`.
pub(crate) fn source_label(loc: &Location<'_>) -> Arc<str> {
    let file = loc.file();
    let short = file.rsplit(['/', '\\']).next().unwrap_or(file);
    if short.is_empty() {
        return Arc::from("unknown");
    }
    Arc::from(format!("{short}:{}", loc.line()))
}
