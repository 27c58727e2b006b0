//! Error types.
//!
//! Environmental failures (missing files, failed native calls) never surface
//! as errors; they are logged and collapsed to defaults. Only programming
//! errors reach the caller.

use thiserror::Error;

/// Errors returned synchronously to callers.
#[derive(Debug, Error, PartialEq)]
pub enum ProbeError {
    /// An argument was outside its documented range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Failure while parsing a pseudo-file or command output.
///
/// Parsers return this; collectors log it and fall back to defaults.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}
