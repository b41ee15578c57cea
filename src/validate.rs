//! Validation that collects every failure instead of stopping at the first.
//!
//! Implement [`Validate`] for a type, push messages into the [`Validator`], and
//! the result is either `Ok(())` or a [`ValidationError`] listing all of them.
//!
//! ## Example
//! ```rust
//! use closer::validate::{Validate, Validator};
//!
//! struct Server { host: String, port: u16 }
//!
//! impl Validate for Server {
//!     fn validate(&self, v: &mut Validator) {
//!         v.check(!self.host.is_empty(), "host is required");
//!         v.check(self.port != 0, "port must be greater than 0");
//!     }
//! }
//!
//! let err = Server { host: String::new(), port: 0 }.validated().unwrap_err();
//! assert_eq!(err.to_string(), r#"["host is required","port must be greater than 0"]"#);
//! ```

use std::error::Error as StdError;

use serde::Serialize;
use thiserror::Error;

use crate::codes::Code;

/// A type that can check its own invariants.
pub trait Validate {
    /// Pushes one message per violated rule.
    fn validate(&self, v: &mut Validator);

    /// Runs [`validate`](Validate::validate) and folds the messages into a result.
    fn validated(&self) -> Result<(), ValidationError> {
        let mut v = Validator::default();
        self.validate(&mut v);
        v.finish()
    }
}

/// Message collector handed to [`Validate::validate`].
#[derive(Debug, Default)]
pub struct Validator {
    messages: Vec<String>,
}

impl Validator {
    /// Records `message` unless `ok` holds.
    pub fn check(&mut self, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.messages.push(message.into());
        }
        self
    }

    /// Records `message` unconditionally.
    pub fn push(&mut self, message: impl Into<String>) -> &mut Self {
        self.messages.push(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn finish(self) -> Result<(), ValidationError> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::new(self.messages))
        }
    }
}

/// One or more failed validation rules. Displays as a JSON array of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{}", self.json())]
pub struct ValidationError {
    #[serde(rename = "error_messages")]
    messages: Vec<String>,
}

/// Client-facing view of a [`ValidationError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetails {
    pub code: Code,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ValidationError {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    fn json(&self) -> String {
        serde_json::to_string(&self.messages).unwrap_or_else(|e| e.to_string())
    }

    /// `InvalidArgument` / `"bad validation"` plus every message.
    pub fn details(&self) -> ErrorDetails {
        ErrorDetails {
            code: Code::InvalidArgument,
            message: "bad validation".to_string(),
            details: self.messages.clone(),
        }
    }
}

/// Whether `err`, or any error in its `source()` chain, is a [`ValidationError`].
pub fn is_validation_error(err: &(dyn StdError + 'static)) -> bool {
    as_validation_error(err).is_some()
}

/// The first [`ValidationError`] in `err`'s `source()` chain.
pub fn as_validation_error<'a>(
    err: &'a (dyn StdError + 'static),
) -> Option<&'a ValidationError> {
    let mut cur = Some(err);
    while let Some(e) = cur {
        if let Some(ve) = e.downcast_ref::<ValidationError>() {
            return Some(ve);
        }
        cur = e.source();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Limits {
        min: u32,
        max: u32,
    }

    impl Validate for Limits {
        fn validate(&self, v: &mut Validator) {
            v.check(self.min > 0, "min must be positive")
                .check(self.max >= self.min, "max must not be below min");
        }
    }

    #[test]
    fn test_collects_every_message() {
        let err = Limits { min: 0, max: 0 }.validated().unwrap_err();
        assert_eq!(err.messages(), ["min must be positive"]);

        let mut v = Validator::default();
        Limits { min: 3, max: 1 }.validate(&mut v);
        v.push("extra");
        let err = v.finish().unwrap_err();
        assert_eq!(err.messages(), ["max must not be below min", "extra"]);
    }

    #[test]
    fn test_valid_value_passes() {
        assert!(Limits { min: 1, max: 5 }.validated().is_ok());
    }

    #[test]
    fn test_display_is_json_array() {
        let err = ValidationError::new(["a \"quoted\" field", "b"]);
        assert_eq!(err.to_string(), r#"["a \"quoted\" field","b"]"#);
    }

    #[test]
    fn test_details() {
        let details = ValidationError::new(["x"]).details();
        assert_eq!(details.code, Code::InvalidArgument);
        assert_eq!(details.message, "bad validation");
        assert_eq!(details.details, vec!["x".to_string()]);

        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["code"], "invalid_argument");
    }

    #[test]
    fn test_detected_through_config_error() {
        let err = crate::conf::ConfigError::Invalid(ValidationError::new(["bad"]));
        assert!(is_validation_error(&err));
        let found = as_validation_error(&err).unwrap();
        assert_eq!(found.messages(), ["bad"]);
        assert!(!is_validation_error(&std::io::Error::other("x")));
    }
}
