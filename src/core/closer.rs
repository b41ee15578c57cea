//! # Closer: the coordinator facade.
//!
//! A [`Closer`] binds together the four moving parts of a graceful shutdown:
//!
//! - the **cleanup stack** ([`to_close`](Closer::to_close) and friends),
//! - the **task supervisor** ([`go`](Closer::go), [`TaskHandle::with`]),
//! - the **signal watcher** (installed at construction),
//! - the **drain** ([`close`](Closer::close), [`wait`](Closer::wait)).
//!
//! ## High-level architecture
//! ```text
//! startup:   to_close(f) ──► CleanupStack (append, source = caller file:line)
//!            go(body)    ──► TaskSupervisor (spawn, scope = root.child_token())
//!
//! triggers:  SIGINT/SIGTERM ─┐
//!            task Err/panic ─┼──► initiate_shutdown() ──► close(Deadline::after(cfg.shutdown_timeout))
//!            wait(): tasks  ─┘
//!            user close(d) ─────────────────────────────► close(d)
//!
//! close:     started.swap(true)? ── no ──► spawn drain ──► root.cancel()
//!                 │                                       └► CleanupStack::drain_reverse()
//!                 │                                       └► run each entry (LIFO, deadline-checked)
//!                 │                                       └► done.release()
//!                 └── every caller ──► done.wait() ──► first_error
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use closer::{Closer, TaskError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let closer = Closer::builder(Default::default())
//!         .with_signals(&[])
//!         .build()?;
//!
//!     closer.to_close_named("db pool", |_deadline| async move {
//!         // pool.close().await
//!         Ok(())
//!     });
//!
//!     closer.go(|ctx| async move {
//!         ctx.cancelled().await;
//!         Err(TaskError::Canceled)
//!     });
//!
//!     closer.close(Duration::from_secs(10)).await?;
//!     closer.wait().await?;
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::builder::CloserBuilder;
use super::cleanup::{CleanupStack, CloseEntry, CloseFn, source_label};
use super::config::Config;
use super::deadline::Deadline;
use super::latch::Latch;
use super::signals::{Signal, SignalWatcher};
use super::sink::SinkSlot;
use super::supervisor::{TaskHandle, TaskSupervisor};
use crate::error::{ShutdownError, TaskError};
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// State shared by the facade, task handles, running tasks and the signal watcher.
pub(crate) struct Inner {
    pub(crate) cfg: Config,
    /// Parent of every task scope; cancelled first thing in the drain.
    pub(crate) root: CancellationToken,
    pub(crate) cleanups: CleanupStack,
    pub(crate) sink: Arc<SinkSlot>,
    pub(crate) supervisor: TaskSupervisor,
    /// One-shot gate: set by the first `close`.
    pub(crate) started: AtomicBool,
    /// Released when the drain returns.
    pub(crate) done: Latch,
    pub(crate) first_error: OnceLock<ShutdownError>,
    pub(crate) is_global: bool,
    /// Cancelled when the last handle goes away, so the signal watcher can exit.
    detached: CancellationToken,
}

impl Inner {
    /// Records `err` unless an error is already stored. Returns whether it was stored.
    pub(crate) fn set_first_err(&self, err: ShutdownError) -> bool {
        self.first_error.set(err).is_ok()
    }

    pub(crate) fn result(&self) -> Result<(), ShutdownError> {
        match self.first_error.get() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.done.is_released()
    }

    /// Internal trigger used by the signal watcher, failing tasks and `wait`.
    pub(crate) async fn initiate_shutdown(self: &Arc<Self>) {
        let _ = self
            .close(Deadline::after(self.cfg.shutdown_timeout))
            .await;
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.detached.cancel();
    }
}

/// Graceful shutdown coordinator.
///
/// Cheap to clone; clones drive the same coordinator.
#[derive(Clone)]
pub struct Closer {
    pub(crate) inner: Arc<Inner>,
}

impl Closer {
    /// Coordinator watching `SIGINT` + `SIGTERM`, logging through [`LogWriter`](crate::LogWriter).
    ///
    /// Must be called inside a tokio runtime. If the signal listeners cannot be
    /// registered, a warning is logged and the coordinator works without them;
    /// use [`Closer::builder`] to get the registration error instead.
    pub fn new() -> Self {
        CloserBuilder::new(Config::default()).build_lenient()
    }

    /// Coordinator watching the given signals (`&[]` = none).
    pub fn with_signals(signals: &[Signal]) -> Self {
        CloserBuilder::new(Config::default())
            .with_signals(signals)
            .build_lenient()
    }

    /// Coordinator with a custom sink, watching `signals` (`None` = the defaults).
    pub fn new_with_logger(logger: Arc<dyn Subscribe>, signals: Option<&[Signal]>) -> Self {
        let builder = CloserBuilder::new(Config::default()).with_logger(logger);
        match signals {
            Some(signals) => builder.with_signals(signals),
            None => builder,
        }
        .build_lenient()
    }

    /// Starts a builder from `cfg`.
    pub fn builder(cfg: Config) -> CloserBuilder {
        CloserBuilder::new(cfg)
    }

    /// Wires the parts together and starts the signal watcher, if any.
    pub(crate) fn assemble(
        cfg: Config,
        sink: Arc<dyn Subscribe>,
        is_global: bool,
        watcher: Option<SignalWatcher>,
    ) -> Self {
        let root = CancellationToken::new();
        let inner = Arc::new(Inner {
            supervisor: TaskSupervisor::new(&root),
            sink: SinkSlot::new(sink, is_global),
            cleanups: CleanupStack::new(),
            started: AtomicBool::new(false),
            done: Latch::new(),
            first_error: OnceLock::new(),
            detached: CancellationToken::new(),
            root,
            cfg,
            is_global,
        });
        if let Some(watcher) = watcher {
            spawn_signal_watcher(&inner, watcher);
        }
        Self { inner }
    }

    /// Replaces the sink. Takes effect for every event emitted afterwards,
    /// including those of cleanups that are already registered.
    pub fn set_logger(&self, logger: Arc<dyn Subscribe>) {
        self.inner.sink.set(logger);
    }

    /// Root cancellation token: cancelled when shutdown starts, parent of every task scope.
    pub fn context(&self) -> CancellationToken {
        self.inner.root.clone()
    }

    /// Registers a cleanup, labelled with the caller's `file.rs:line`.
    ///
    /// Cleanups run newest first. A registration racing with shutdown may be dropped.
    #[track_caller]
    pub fn to_close<F, Fut>(&self, f: F)
    where
        F: FnOnce(Deadline) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.to_close_all([CloseFn::new(f)]);
    }

    /// Registers several cleanups at once, in the given order, sharing one source label.
    #[track_caller]
    pub fn to_close_all<I>(&self, fns: I)
    where
        I: IntoIterator<Item = CloseFn>,
    {
        let source = source_label(Location::caller());
        self.inner
            .cleanups
            .register(fns.into_iter().map(|action| CloseEntry {
                action,
                source: Arc::clone(&source),
                name: None,
            }));
    }

    /// Registers a cleanup whose start and end (with duration and error) are logged under `name`.
    #[track_caller]
    pub fn to_close_named<F, Fut>(&self, name: impl Into<Arc<str>>, f: F)
    where
        F: FnOnce(Deadline) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let source = source_label(Location::caller());
        let name: Arc<str> = name.into();
        let action = CloseFn::new(f).named(
            Arc::clone(&name),
            Arc::clone(&source),
            Arc::clone(&self.inner.sink),
        );
        self.inner.cleanups.register([CloseEntry {
            action,
            source,
            name: Some(name),
        }]);
    }

    /// Spawns a supervised task.
    ///
    /// The body receives the shared task scope. `Err` (other than
    /// [`TaskError::Canceled`]) or a panic is captured as the first error and
    /// starts a shutdown.
    pub fn go<F, Fut>(&self, body: F) -> TaskHandle
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let started = Latch::new();
        self.inner.dispatch(None, started.clone(), body);
        TaskHandle::new(Arc::clone(&self.inner), started)
    }

    /// Shuts down with a drain deadline of `timeout` from now.
    ///
    /// See [`Closer::close_with`].
    pub async fn close(&self, timeout: Duration) -> Result<(), ShutdownError> {
        self.close_with(Deadline::after(timeout)).await
    }

    /// Shuts down within `deadline`.
    ///
    /// The first call (from any trigger) cancels the root token and drains the
    /// cleanup stack; every call waits for that drain and returns the same
    /// first error. Later deadlines are ignored.
    pub async fn close_with(&self, deadline: Deadline) -> Result<(), ShutdownError> {
        self.inner.close(deadline).await
    }

    /// Waits until shutdown has fully completed and returns the first error.
    ///
    /// If every task returns before anything else starts a shutdown, `wait`
    /// starts one itself.
    pub async fn wait(&self) -> Result<(), ShutdownError> {
        let inner = &self.inner;
        tokio::select! {
            _ = inner.supervisor.wait() => {
                if !inner.is_closed() {
                    inner.initiate_shutdown().await;
                }
            }
            _ = inner.done.wait() => {}
        }
        inner.done.wait().await;
        inner.result()
    }

    /// Whether the drain has finished.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Whether shutdown has been initiated (the drain may still be running).
    pub fn is_shutting_down(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Number of cleanups currently registered.
    pub fn pending_cleanups(&self) -> usize {
        self.inner.cleanups.len()
    }

    /// Number of supervised tasks still running.
    pub fn running_tasks(&self) -> usize {
        self.inner.supervisor.len()
    }

    /// Whether this is the process-wide coordinator.
    pub fn is_global(&self) -> bool {
        self.inner.is_global
    }

    /// Configuration the coordinator was built with.
    pub fn config(&self) -> &Config {
        &self.inner.cfg
    }
}

impl Default for Closer {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for the first watched signal, then initiates shutdown.
///
/// Exits quietly once the coordinator is done or dropped; dropping the watcher unsubscribes.
fn spawn_signal_watcher(inner: &Arc<Inner>, mut watcher: SignalWatcher) {
    let weak = Arc::downgrade(inner);
    let done = inner.done.clone();
    let detached = inner.detached.clone();

    tokio::spawn(async move {
        tokio::select! {
            sig = watcher.recv() => {
                let Some(inner) = weak.upgrade() else { return };
                inner
                    .sink
                    .emit(Event::new(EventKind::SignalReceived).with_signal(sig.as_str()))
                    .await;
                inner.initiate_shutdown().await;
            }
            _ = done.wait() => {}
            _ = detached.cancelled() => {}
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscribers::Discard;

    #[tokio::test]
    async fn test_new_with_logger_signal_choice() {
        let no_signals: &[Signal] = &[];
        let quiet = Closer::new_with_logger(Arc::new(Discard), Some(no_signals));
        assert!(quiet.config().signals.is_empty());

        let defaults = Closer::new_with_logger(Arc::new(Discard), None);
        assert_eq!(defaults.config().signals, Config::default().signals);

        assert_eq!(quiet.close(Duration::from_secs(1)).await, Ok(()));
        assert_eq!(defaults.close(Duration::from_secs(1)).await, Ok(()));
    }
}
