//! Error types used by the closer runtime, its tasks and its cleanup actions.
//!
//! This module defines two main error enums:
//!
//! - [`TaskError`] — errors returned by task bodies and cleanup actions.
//! - [`ShutdownError`] — the single first-error value surfaced by
//!   [`Closer::close`](crate::Closer::close) and [`Closer::wait`](crate::Closer::wait).
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logs and metrics.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::codes::Code;

/// # Errors produced by task bodies and cleanup actions.
///
/// A task returning [`TaskError::Canceled`] is treated as a graceful exit: the
/// error is not captured and does not trigger a shutdown.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Execution failed.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task observed its cancellation token and stopped.
    #[error("context canceled")]
    Canceled,
}

impl TaskError {
    /// Builds a [`TaskError::Fail`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use closer::TaskError;
    ///
    /// let err = TaskError::fail("connection reset");
    /// assert_eq!(err.to_string(), "connection reset");
    /// ```
    pub fn fail(error: impl fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "context canceled".to_string(),
        }
    }

    /// Whether this error means the task stopped because it was told to.
    pub fn is_canceled(&self) -> bool {
        matches!(self, TaskError::Canceled)
    }
}

impl From<String> for TaskError {
    fn from(error: String) -> Self {
        TaskError::Fail { error }
    }
}

impl From<&str> for TaskError {
    fn from(error: &str) -> Self {
        TaskError::fail(error)
    }
}

impl From<std::io::Error> for TaskError {
    fn from(error: std::io::Error) -> Self {
        TaskError::fail(error)
    }
}

/// # The first error observed by a coordinator.
///
/// Propagation is first-wins: whichever of these arrives first is stored and
/// returned by every `close`/`wait` caller; later failures only reach the logs.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShutdownError {
    /// A task body returned an error.
    #[error("{0}")]
    Task(TaskError),

    /// A task body panicked.
    #[error("panic recovered in task: {message}")]
    TaskPanicked {
        /// Panic payload rendered as text.
        message: String,
    },

    /// A cleanup action returned an error.
    #[error("{error}")]
    Cleanup {
        /// Source label of the cleanup (where it was registered from).
        origin: String,
        /// The error returned by the action.
        error: TaskError,
    },

    /// A cleanup action panicked; the drain carried on with the next entry.
    #[error("panic recovered in closer")]
    CleanupPanicked {
        /// Position of the entry in drain order (0 = first to run).
        index: usize,
        /// Source label of the cleanup (where it was registered from).
        origin: String,
        /// Panic payload rendered as text.
        panic: String,
    },

    /// The drain deadline expired before every cleanup ran.
    #[error("shutdown deadline exceeded after {deadline:?}")]
    DeadlineExceeded {
        /// Length of the deadline scope the drain was given.
        deadline: Duration,
    },

    /// The deadline scope was cancelled before every cleanup ran.
    #[error("shutdown context canceled")]
    Canceled,
}

impl ShutdownError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use closer::ShutdownError;
    /// use std::time::Duration;
    ///
    /// let err = ShutdownError::DeadlineExceeded { deadline: Duration::from_secs(5) };
    /// assert_eq!(err.as_label(), "shutdown_deadline_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ShutdownError::Task(_) => "shutdown_task_failed",
            ShutdownError::TaskPanicked { .. } => "shutdown_task_panicked",
            ShutdownError::Cleanup { .. } => "shutdown_cleanup_failed",
            ShutdownError::CleanupPanicked { .. } => "shutdown_cleanup_panicked",
            ShutdownError::DeadlineExceeded { .. } => "shutdown_deadline_exceeded",
            ShutdownError::Canceled => "shutdown_canceled",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ShutdownError::Task(e) => format!("task: {}", e.as_message()),
            ShutdownError::TaskPanicked { message } => format!("task panic: {message}"),
            ShutdownError::Cleanup { origin, error } => {
                format!("closer {origin}: {}", error.as_message())
            }
            ShutdownError::CleanupPanicked {
                index,
                origin,
                panic,
            } => format!("closer #{index} ({origin}) panicked: {panic}"),
            ShutdownError::DeadlineExceeded { deadline } => {
                format!("deadline of {deadline:?} exceeded")
            }
            ShutdownError::Canceled => "shutdown context canceled".to_string(),
        }
    }

    /// Maps the error onto the stable [`Code`] enumeration.
    pub fn code(&self) -> Code {
        match self {
            ShutdownError::Task(_) | ShutdownError::Cleanup { .. } => Code::Unknown,
            ShutdownError::TaskPanicked { .. } | ShutdownError::CleanupPanicked { .. } => {
                Code::Internal
            }
            ShutdownError::DeadlineExceeded { .. } => Code::DeadlineExceeded,
            ShutdownError::Canceled => Code::Canceled,
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_displays_bare_message() {
        let err = TaskError::fail("cx");
        assert_eq!(err.to_string(), "cx");
        assert_eq!(err.as_label(), "task_failed");
    }

    #[test]
    fn test_cleanup_error_displays_underlying_error() {
        let err = ShutdownError::Cleanup {
            origin: "db.rs:10".into(),
            error: TaskError::fail("bx"),
        };
        assert_eq!(err.to_string(), "bx");
        assert_eq!(err.as_message(), "closer db.rs:10: error: bx");
    }

    #[test]
    fn test_cleanup_panic_has_stable_message() {
        let err = ShutdownError::CleanupPanicked {
            index: 0,
            origin: "main.rs:3".into(),
            panic: "boom".into(),
        };
        assert_eq!(err.to_string(), "panic recovered in closer");
        assert_eq!(err.code(), Code::Internal);
    }

    #[test]
    fn test_codes() {
        let deadline = ShutdownError::DeadlineExceeded {
            deadline: Duration::from_millis(50),
        };
        assert_eq!(deadline.code(), Code::DeadlineExceeded);
        assert_eq!(ShutdownError::Canceled.code(), Code::Canceled);
        assert_eq!(
            ShutdownError::Task(TaskError::fail("t!")).code(),
            Code::Unknown
        );
    }

    #[test]
    fn test_panic_message_payloads() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");
        let other: Box<dyn std::any::Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
