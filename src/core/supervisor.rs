//! # Task supervisor: concurrent tasks under one cancellation scope.
//!
//! Every task spawned through [`Closer::go`](crate::Closer::go) or
//! [`TaskHandle::with`] runs on the tokio multi-worker runtime and receives the
//! same **task scope**, a child of the coordinator's root token.
//!
//! ## Flow
//! ```text
//! go(body) ──► tracker.spawn(wrapper)
//!
//! wrapper:
//!   ├─► (sequel only) wait for parent's started latch
//!   ├─► release own started latch
//!   ├─► body(scope) under catch_unwind
//!   │       ├─ Ok(())                → done
//!   │       ├─ Err(Canceled)         → done (graceful exit)
//!   │       ├─ Err(e)                → TaskFailed   ─┐
//!   │       └─ panic                 → TaskPanicked ─┤
//!   │                                               ▼
//!   └─► first_error.set(e) → scope.cancel() → initiate_shutdown()
//! ```
//!
//! ## Rules
//! - No ordering between tasks other than "sequel starts after its parent started"
//! - Cancelling the root cancels every task scope
//! - The first failing task cancels the scope before shutdown is initiated
//! - A failure always routes through the shutdown gate, so shutdown runs once however many tasks fail

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::closer::Inner;
use super::latch::Latch;
use crate::error::{ShutdownError, TaskError, panic_message};
use crate::events::{Event, EventKind};

/// Tracks running tasks and owns their shared scope.
pub(crate) struct TaskSupervisor {
    tracker: TaskTracker,
    scope: CancellationToken,
}

impl TaskSupervisor {
    pub(crate) fn new(root: &CancellationToken) -> Self {
        Self {
            tracker: TaskTracker::new(),
            scope: root.child_token(),
        }
    }

    pub(crate) fn scope(&self) -> CancellationToken {
        self.scope.clone()
    }

    pub(crate) fn cancel_scope(&self) {
        self.scope.cancel();
    }

    pub(crate) fn len(&self) -> usize {
        self.tracker.len()
    }

    /// Completes once every task spawned so far has returned.
    pub(crate) async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tracker.spawn(fut);
    }
}

impl Inner {
    /// Spawns `body` as a supervised task.
    ///
    /// `after` delays the body until that latch is released; `started` is
    /// released as soon as the body is about to run.
    pub(crate) fn dispatch<F, Fut>(self: &Arc<Self>, after: Option<Latch>, started: Latch, body: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let inner = Arc::clone(self);
        let scope = self.supervisor.scope();

        self.supervisor.spawn(async move {
            if let Some(parent) = after {
                parent.wait().await;
            }
            started.release();

            let outcome = AssertUnwindSafe(async move { body(scope).await })
                .catch_unwind()
                .await;

            let err = match outcome {
                Ok(Ok(())) => return,
                Ok(Err(e)) if e.is_canceled() => return,
                Ok(Err(e)) => {
                    inner
                        .sink
                        .emit(Event::new(EventKind::TaskFailed).with_error(e.to_string()))
                        .await;
                    ShutdownError::Task(e)
                }
                Err(panic) => {
                    let message = panic_message(&*panic);
                    inner
                        .sink
                        .emit(Event::new(EventKind::TaskPanicked).with_panic(message.as_str()))
                        .await;
                    ShutdownError::TaskPanicked { message }
                }
            };
            inner.task_failed(err).await;
        });
    }

    async fn task_failed(self: &Arc<Self>, err: ShutdownError) {
        self.set_first_err(err);
        self.supervisor.cancel_scope();
        self.initiate_shutdown().await;
    }
}

/// Handle to a dispatched task, used to chain sequel tasks.
///
/// ## Example
/// ```rust
/// use closer::{Closer, TaskError};
///
/// # #[tokio::main]
/// # async fn main() {
/// let closer = Closer::with_signals(&[]);
/// closer
///     .go(|ctx| async move { ctx.cancelled().await; Ok(()) })   // server
///     .with(|_ctx| async move { Ok::<_, TaskError>(()) })        // starts after the server started
///     .with(|_ctx| async move { Ok(()) });
/// # let _ = closer.close(std::time::Duration::from_secs(1)).await;
/// # }
/// ```
#[derive(Clone)]
pub struct TaskHandle {
    inner: Arc<Inner>,
    started: Latch,
}

impl TaskHandle {
    pub(crate) fn new(inner: Arc<Inner>, started: Latch) -> Self {
        Self { inner, started }
    }

    /// Spawns a sequel task whose body runs only after this handle's task has started.
    ///
    /// Same error capture as [`Closer::go`](crate::Closer::go). Returns the same
    /// handle, so every `.with(..)` in a chain depends on the original task.
    pub fn with<F, Fut>(&self, body: F) -> &Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        self.inner
            .dispatch(Some(self.started.clone()), Latch::new(), body);
        self
    }

    /// Whether the task body has begun executing.
    pub fn is_started(&self) -> bool {
        self.started.is_released()
    }

    /// Completes once the task body has begun executing.
    pub async fn started(&self) {
        self.started.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::Closer;
    use crate::core::testkit::quiet_closer;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sequel_starts_after_parent() {
        let (closer, _rec) = quiet_closer();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let handle = closer.go(move |ctx| async move {
            ctx.cancelled().await;
            Ok(())
        });
        for _ in 0..3 {
            let parent = handle.clone();
            let seen = seen.clone();
            handle.with(move |_ctx| async move {
                seen.lock().unwrap().push(parent.is_started());
                Ok(())
            });
        }

        handle.started().await;
        assert!(handle.is_started());
        closer.close(Duration::from_secs(1)).await.unwrap();
        closer.wait().await.unwrap();
        while closer.running_tasks() > 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(*seen.lock().unwrap(), vec![true, true, true]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_failing_task_cancels_siblings_and_shuts_down_once() {
        let (closer, rec) = quiet_closer();
        let runs = Arc::new(AtomicUsize::new(0));
        let r = runs.clone();
        closer.to_close(move |_| async move {
            r.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let (saw_cancel, sibling) = tokio::sync::oneshot::channel();
        closer.go(move |ctx| async move {
            ctx.cancelled().await;
            let _ = saw_cancel.send(());
            Err(TaskError::Canceled)
        });
        for i in 0..3 {
            closer.go(move |_ctx| async move {
                tokio::time::sleep(Duration::from_millis(10 + i)).await;
                Err(TaskError::fail(format!("task {i}")))
            });
        }

        let err = closer.wait().await.unwrap_err();
        assert!(matches!(err, ShutdownError::Task(TaskError::Fail { .. })));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        tokio::time::timeout(Duration::from_secs(1), sibling)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rec.count(EventKind::ShutdownStarting), 1);
        assert!(rec.count(EventKind::TaskFailed) >= 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_canceled_return_is_not_an_error() {
        let (closer, rec) = quiet_closer();
        closer.go(|ctx| async move {
            ctx.cancelled().await;
            Err(TaskError::Canceled)
        });

        closer.close(Duration::from_secs(1)).await.unwrap();
        assert_eq!(closer.wait().await, Ok(()));
        assert_eq!(rec.count(EventKind::TaskFailed), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_task_panic_is_captured_and_triggers_shutdown() {
        let (closer, rec) = quiet_closer();
        closer.go(|_ctx| async move {
            if true {
                panic!("task blew up");
            }
            Ok(())
        });

        let err = closer.wait().await.unwrap_err();
        assert_eq!(
            err,
            ShutdownError::TaskPanicked {
                message: "task blew up".into()
            }
        );
        assert!(closer.is_closed());
        assert_eq!(rec.count(EventKind::TaskPanicked), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wait_closes_when_all_tasks_return() {
        let (closer, rec) = quiet_closer();
        closer.go(|_ctx| async move { Ok(()) });
        closer.go(|_ctx| async move { Ok(()) });

        assert_eq!(closer.wait().await, Ok(()));
        assert!(closer.is_closed());
        assert_eq!(closer.running_tasks(), 0);
        assert_eq!(rec.count(EventKind::NothingToClose), 1);
    }

    #[tokio::test]
    async fn test_scope_is_child_of_root() {
        let closer: Closer = quiet_closer().0;
        let scope = closer.inner.supervisor.scope();
        assert!(!scope.is_cancelled());
        closer.context().cancel();
        assert!(scope.is_cancelled());
    }
}
