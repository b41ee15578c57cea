//! Runtime core: orchestration and lifecycle.
//!
//! The public surface of this module is [`Closer`] (with its builder and task
//! handle), the [`Deadline`] handed to cleanups, and the global coordinator
//! functions.
//!
//! Internal modules:
//! - [`closer`]: the facade; registration, task spawning, signal watcher;
//! - [`drain`]: the one-shot shutdown gate and LIFO drain;
//! - [`supervisor`]: supervised tasks sharing one cancellation scope;
//! - [`cleanup`]: the cleanup stack and cleanup actions;
//! - [`signals`]: cross-platform OS signal registration;
//! - [`sink`]: the replaceable event sink;
//! - [`latch`]: one-shot signal behind `done` and `started`.

mod builder;
mod cleanup;
mod closer;
mod config;
mod deadline;
mod drain;
mod global;
mod latch;
mod signals;
mod sink;
mod supervisor;

#[cfg(test)]
pub(crate) mod testkit;

pub use builder::CloserBuilder;
pub use cleanup::{CloseFn, CloseFuture};
pub use closer::Closer;
pub use config::{Config, DEFAULT_SHUTDOWN_TIMEOUT};
pub use deadline::Deadline;
pub use global::{
    close, context, global, go, init_global, set_logger, to_close, to_close_all, to_close_named,
    try_global, wait,
};
pub use signals::Signal;
pub use supervisor::TaskHandle;
