//! # closer
//!
//! **Closer** is a graceful shutdown coordinator for tokio services.
//!
//! It collects cleanup actions while a program starts up, supervises the
//! program's concurrent tasks, listens for termination signals, and on shutdown
//! runs the cleanups in reverse registration order within a deadline, reporting
//! the first error observed anywhere.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   to_close(f)          go(body)              SIGINT / SIGTERM
//!       │                   │                        │
//!       ▼                   ▼                        ▼
//! ┌─────────────┐   ┌────────────────┐      ┌────────────────┐
//! │CleanupStack │   │ TaskSupervisor │      │ SignalWatcher  │
//! │ (LIFO, file │   │ (TaskTracker,  │      │ (registered at │
//! │  :line tag) │   │  shared scope) │      │  construction) │
//! └──────┬──────┘   └───────┬────────┘      └───────┬────────┘
//!        │        Err/panic │                       │
//!        │                  ▼                       ▼
//!        │         ┌──────────────────────────────────────────┐
//!        └────────►│ close(deadline): one-shot gate           │◄── user close(d)
//!                  │   root.cancel() → drain LIFO → done      │◄── wait() (tasks all returned)
//!                  └───────────────────┬──────────────────────┘
//!                                      ▼
//!                         first error (identical for every caller)
//!
//!   every step ──► Event ──► sink (LogWriter → tracing | SubscriberSet | Discard | custom)
//! ```
//!
//! ### Lifecycle
//! ```text
//! Closer::new() ──► register signals ──► to_close / go ...
//!
//! trigger (signal | task failure | close() | all tasks done in wait())
//!   └─► started.swap(true)            (later triggers just wait)
//!        ├─► root token cancelled     (every task scope observes it)
//!        ├─► cleanups newest → oldest, deadline checked before each
//!        │      ├─ error  → recorded if first
//!        │      └─ panic  → recovered, recorded if first, drain continues
//!        └─► done released ──► close()/wait() return first error
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / functions                       |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Coordinator**   | Register cleanups, spawn tasks, shut down once.               | [`Closer`], [`CloserBuilder`], [`TaskHandle`] |
//! | **Deadlines**     | Bounded drain; cleanups observe the same deadline.            | [`Deadline`], [`CloseFn`]                   |
//! | **Signals**       | Configurable OS signal set.                                   | [`Signal`], [`Config`]                      |
//! | **Subscriber API**| Structured lifecycle events for logging.                      | [`Subscribe`], [`LogWriter`], [`SubscriberSet`] |
//! | **Errors**        | Typed, cloneable first-error value.                           | [`TaskError`], [`ShutdownError`]            |
//! | **Global**        | Eagerly installed process-wide coordinator and forwarders.    | [`init_global()`], [`to_close()`], [`wait()`] |
//! | **Config**        | Flags + file + env reader for any serde type.                 | [`conf::Reader`]                            |
//! | **Codes**         | gRPC-style error codes and validation errors.                 | [`codes::Code`], [`validate::Validate`]     |
//! | **Schema**        | Serves an API schema document over HTTP (`schema` feature).   | `schema::SchemaServer`                      |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use closer::{Closer, TaskError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let closer = Closer::with_signals(&[]);
//!
//!     closer.to_close(|_deadline| async move {
//!         println!("closing db");
//!         Ok(())
//!     });
//!     closer.to_close_named("http server", |deadline| async move {
//!         tokio::select! {
//!             _ = tokio::time::sleep(Duration::from_millis(10)) => Ok(()),
//!             _ = deadline.expired() => Err(TaskError::fail("server drain timed out")),
//!         }
//!     });
//!
//!     closer.go(|ctx| async move {
//!         ctx.cancelled().await;
//!         Err(TaskError::Canceled)
//!     });
//!
//!     closer.close(Duration::from_secs(5)).await?;
//!     closer.wait().await?;
//!     Ok(())
//! }
//! ```
pub mod codes;
pub mod conf;
mod core;
mod error;
mod events;
#[cfg(feature = "schema")]
pub mod schema;
mod subscribers;
pub mod validate;

// ---- Public re-exports ----

pub use self::core::{
    CloseFn, CloseFuture, Closer, CloserBuilder, Config, DEFAULT_SHUTDOWN_TIMEOUT, Deadline,
    Signal, TaskHandle,
};
pub use self::core::{
    close, context, global, go, init_global, set_logger, to_close, to_close_all, to_close_named,
    try_global, wait,
};
pub use error::{ShutdownError, TaskError};
pub use events::{Event, EventKind};
pub use subscribers::{Discard, LogWriter, Subscribe, SubscriberSet};
