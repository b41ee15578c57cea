//! # Process-wide coordinator.
//!
//! [`init_global`] builds the one process-wide [`Closer`] up front, at program
//! start, so its signal listeners are armed before anything else runs. Every
//! event it emits carries `global = true`. The free functions below forward to
//! it, so small programs never need to pass a coordinator around.
//!
//! Nothing is created on demand: using a forwarding function before
//! [`init_global`] is a programming error and panics, the way `tokio::spawn`
//! does outside a runtime. [`try_global`] is the non-panicking accessor.
//!
//! ## Example
//! ```rust,no_run
//! use closer::{Closer, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> std::io::Result<()> {
//! closer::init_global(Closer::builder(Config::default()))?;
//!
//! closer::to_close(|_deadline| async move { Ok(()) });
//! closer::go(|ctx| async move { ctx.cancelled().await; Ok(()) });
//! if let Err(err) = closer::wait().await {
//!     eprintln!("shutdown: {err}");
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::io;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::builder::CloserBuilder;
use super::cleanup::CloseFn;
use super::closer::Closer;
use super::deadline::Deadline;
use super::supervisor::TaskHandle;
use crate::error::{ShutdownError, TaskError};
use crate::subscribers::Subscribe;

static GLOBAL: OnceLock<Closer> = OnceLock::new();

/// Builds the process-wide coordinator from `builder` and installs it.
///
/// Call once, early in `main`, inside a tokio runtime.
///
/// # Errors
/// Fails with [`io::ErrorKind::AlreadyExists`] when a global coordinator is
/// already installed, or when a signal listener cannot be registered.
pub fn init_global(builder: CloserBuilder) -> io::Result<&'static Closer> {
    if GLOBAL.get().is_some() {
        return Err(already_initialized());
    }
    let closer = builder.global().build()?;
    GLOBAL.set(closer).map_err(|_| already_initialized())?;
    GLOBAL.get().ok_or_else(already_initialized)
}

fn already_initialized() -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        "global closer is already initialized",
    )
}

/// The process-wide coordinator, if [`init_global`] has run.
pub fn try_global() -> Option<&'static Closer> {
    GLOBAL.get()
}

/// The process-wide coordinator.
///
/// # Panics
/// If [`init_global`] has not been called.
#[track_caller]
pub fn global() -> &'static Closer {
    match GLOBAL.get() {
        Some(closer) => closer,
        None => panic!("closer::init_global must be called before using the global coordinator"),
    }
}

/// Replaces the global coordinator's sink.
pub fn set_logger(logger: Arc<dyn Subscribe>) {
    global().set_logger(logger);
}

/// Root cancellation token of the global coordinator.
pub fn context() -> CancellationToken {
    global().context()
}

/// Registers a cleanup on the global coordinator.
#[track_caller]
pub fn to_close<F, Fut>(f: F)
where
    F: FnOnce(Deadline) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    global().to_close(f);
}

/// Registers several cleanups on the global coordinator.
#[track_caller]
pub fn to_close_all<I>(fns: I)
where
    I: IntoIterator<Item = CloseFn>,
{
    global().to_close_all(fns);
}

/// Registers a named cleanup on the global coordinator.
#[track_caller]
pub fn to_close_named<F, Fut>(name: impl Into<Arc<str>>, f: F)
where
    F: FnOnce(Deadline) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    global().to_close_named(name, f);
}

/// Spawns a supervised task on the global coordinator.
pub fn go<F, Fut>(body: F) -> TaskHandle
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    global().go(body)
}

/// Shuts the global coordinator down within `timeout`.
pub async fn close(timeout: Duration) -> Result<(), ShutdownError> {
    global().close(timeout).await
}

/// Waits for the global coordinator to finish shutting down.
pub async fn wait() -> Result<(), ShutdownError> {
    global().wait().await
}
