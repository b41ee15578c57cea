//! Stable error codes and a code-tagged error.
//!
//! [`Code`] follows the gRPC status numbering so the value can travel over an
//! RPC boundary unchanged. [`CodedError`] pairs a message with a code; use
//! [`as_coded_error`] to find one anywhere in an error's `source()` chain.
//!
//! ## Example
//! ```rust
//! use closer::codes::{self, Code, CodedError};
//!
//! let err = CodedError::new("user not found", Code::NotFound);
//! assert_eq!(err.to_string(), "user not found");
//! assert!(codes::is_coded_error(&err));
//! assert_eq!(codes::as_coded_error(&err).map(CodedError::code), Some(Code::NotFound));
//! ```

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical status codes (gRPC numbering).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Code {
    Ok = 0,
    Canceled = 1,
    Unknown = 2,
    InvalidArgument = 3,
    DeadlineExceeded = 4,
    NotFound = 5,
    AlreadyExists = 6,
    PermissionDenied = 7,
    ResourceExhausted = 8,
    FailedPrecondition = 9,
    Aborted = 10,
    OutOfRange = 11,
    Unimplemented = 12,
    Internal = 13,
    Unavailable = 14,
    DataLoss = 15,
    Unauthenticated = 16,
}

impl Code {
    /// Numeric value of the code.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            Code::Ok => "ok",
            Code::Canceled => "canceled",
            Code::Unknown => "unknown",
            Code::InvalidArgument => "invalid_argument",
            Code::DeadlineExceeded => "deadline_exceeded",
            Code::NotFound => "not_found",
            Code::AlreadyExists => "already_exists",
            Code::PermissionDenied => "permission_denied",
            Code::ResourceExhausted => "resource_exhausted",
            Code::FailedPrecondition => "failed_precondition",
            Code::Aborted => "aborted",
            Code::OutOfRange => "out_of_range",
            Code::Unimplemented => "unimplemented",
            Code::Internal => "internal",
            Code::Unavailable => "unavailable",
            Code::DataLoss => "data_loss",
            Code::Unauthenticated => "unauthenticated",
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Error carrying a message and a [`Code`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CodedError {
    message: String,
    code: Code,
}

impl CodedError {
    pub fn new(message: impl Into<String>, code: Code) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    pub fn code(&self) -> Code {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Whether `err`, or any error in its `source()` chain, is a [`CodedError`].
pub fn is_coded_error(err: &(dyn StdError + 'static)) -> bool {
    as_coded_error(err).is_some()
}

/// The first [`CodedError`] in `err`'s `source()` chain, starting with `err` itself.
pub fn as_coded_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a CodedError> {
    let mut cur = Some(err);
    while let Some(e) = cur {
        if let Some(coded) = e.downcast_ref::<CodedError>() {
            return Some(coded);
        }
        cur = e.source();
    }
    None
}
