//! Error types for JSON binding.
//!
//! All failures surfaced by the engine indicate a data/schema mismatch and
//! are never retried internally. Errors that arise below the top-level call
//! carry the JSON property path (`$.orders[2].total`) of the offending value.
//!
//! ## Error Categories
//!
//! - **Type resolution**: a generic type variable could not be bound to a
//!   concrete runtime type anywhere in the inheritance chain
//! - **Structure**: the JSON shape does not match the requested target shape
//! - **Custom handler**: a user-registered serializer/deserializer failed
//! - **Recursion limit**: the bounded depth guard tripped (typically a
//!   handler re-entering the engine on a self-referential structure)
//!
//! Quoting decisions made by the numeric precision policy are *not* errors;
//! they are deterministic formatting outcomes.

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur during binding.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A generic type variable cannot be bound to a concrete runtime type.
    #[error("unresolved type variable '{variable}' of {class}: no binding found in inheritance chain")]
    TypeResolution { variable: String, class: String },

    /// JSON shape does not match the requested target shape.
    #[error("structure mismatch at {path}: expected {expected}, found {found}")]
    Structure {
        path: String,
        expected: String,
        found: String,
    },

    /// A cyclic object graph was detected during built-in dispatch.
    #[error("cyclic object graph detected at {path}")]
    Cycle { path: String },

    /// A user-supplied handler raised during delegation.
    #[error("custom handler failed at {path}: {message}")]
    CustomHandler { path: String, message: String },

    /// The bounded recursion-depth guard tripped.
    #[error("recursion limit of {limit} exceeded at {path}")]
    RecursionLimit { limit: usize, path: String },

    /// A token could not be parsed as a decimal numeral.
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    /// The JSON provider rejected the input text.
    #[error("syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    /// A value with no JSON representation (e.g. a non-finite float).
    #[error("unsupported value: {0}")]
    Unsupported(String),

    /// IO error during reading or writing.
    #[error("IO error: {0}")]
    Io(String),

    /// Generic message.
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Creates a type resolution error for an unbound variable.
    pub fn type_resolution(variable: &str, class: &str) -> Self {
        Error::TypeResolution {
            variable: variable.to_string(),
            class: class.to_string(),
        }
    }

    /// Creates a structure mismatch error at the given property path.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use jsonbind::Error;
    ///
    /// let err = Error::structure("$.age", "number", "string");
    /// assert!(err.to_string().contains("expected number"));
    /// ```
    pub fn structure(path: &str, expected: &str, found: &str) -> Self {
        Error::Structure {
            path: path.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Creates a custom handler error with path context attached.
    pub fn custom_handler(path: &str, message: &str) -> Self {
        Error::CustomHandler {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Creates a syntax error with the provider's position information.
    pub fn syntax(line: usize, column: usize, message: &str) -> Self {
        Error::Syntax {
            line,
            column,
            message: message.to_string(),
        }
    }

    /// Creates an unsupported value error.
    pub fn unsupported(msg: &str) -> Self {
        Error::Unsupported(msg.to_string())
    }

    /// Creates an I/O error.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Message(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
