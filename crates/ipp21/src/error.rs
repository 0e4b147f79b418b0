//! # Error Handling for the IPPcode21 Interpreter
//!
//! This module defines the **error kinds** and the **interpreter error**
//! type used throughout the loader and execution engine.
//!
//! ## Design
//! - [`ErrorKind`] is a closed, categorical enumeration. Each variant maps
//!   to exactly one process exit code from the IPPcode21 specification.
//! - [`IppError`] pairs a kind with a human-readable message, the way
//!   callers actually want to report failures (to stderr, with context).
//!
//! ## Display
//! - Implements [`fmt::Display`] for `IppError`, giving a single line
//!   suitable for printing to the error sink.
//! - Implements [`std::error::Error`] so `IppError` composes with `?` and
//!   the rest of Rust's error-handling ecosystem.

use std::fmt;

/// Closed enumeration of interpreter failure categories.
///
/// Each variant corresponds to one exit code from the specification; the
/// numeric value is recovered with [`ErrorKind::exit_code`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or contradictory command-line parameters.
    BadParam,
    /// A required file could not be opened.
    OpenErr,
    /// A configured sink could not be written to.
    WriteErr,
    /// The XML document is not well-formed.
    BadXml,
    /// The XML document is well-formed but violates the program schema.
    BadStruct,
    /// A label or variable was redefined, or a referenced label is undeclared.
    UndefRedef,
    /// An operator was applied to a value of the wrong type.
    BadOperandType,
    /// A referenced variable does not exist in its frame.
    UndefVar,
    /// A referenced frame (TF or the top of the LF stack) does not exist.
    UndefFrame,
    /// A variable or stack slot was read before being given a value.
    MissingVal,
    /// An operand had the right type but an invalid value (e.g. division by zero).
    BadOperandVal,
    /// A string operation was given an out-of-range index or argument.
    StringErr,
    /// Internal interpreter invariant violation (a bug, not a user error).
    Internal,
}

impl ErrorKind {
    /// The process exit code associated with this error category.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::BadParam => 10,
            ErrorKind::OpenErr => 11,
            ErrorKind::WriteErr => 12,
            ErrorKind::BadXml => 31,
            ErrorKind::BadStruct => 32,
            ErrorKind::UndefRedef => 52,
            ErrorKind::BadOperandType => 53,
            ErrorKind::UndefVar => 54,
            ErrorKind::UndefFrame => 55,
            ErrorKind::MissingVal => 56,
            ErrorKind::BadOperandVal => 57,
            ErrorKind::StringErr => 58,
            ErrorKind::Internal => 99,
        }
    }

    /// Build a full [`IppError`] from this kind with an attached message.
    pub fn with_msg(self, msg: impl Into<String>) -> IppError {
        IppError {
            kind: self,
            message: msg.into(),
        }
    }
}

/// A classified interpreter error with a descriptive message.
///
/// Unlike the old reference implementation (which calls `exit()` from deep
/// inside the parser and the VM), every fallible operation in this crate
/// returns `Result<_, IppError>`. Termination and message printing happen
/// exactly once, at the top of `main`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IppError {
    pub kind: ErrorKind,
    pub message: String,
}

impl IppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        IppError {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for IppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for IppError {}

/// Shorthand for building a [`BadOperandType`](ErrorKind::BadOperandType) error.
pub fn bad_operand_type(msg: impl Into<String>) -> IppError {
    ErrorKind::BadOperandType.with_msg(msg)
}

/// Shorthand for building a [`BadOperandVal`](ErrorKind::BadOperandVal) error.
pub fn bad_operand_val(msg: impl Into<String>) -> IppError {
    ErrorKind::BadOperandVal.with_msg(msg)
}

/// Shorthand for building a [`StringErr`](ErrorKind::StringErr) error.
pub fn string_err(msg: impl Into<String>) -> IppError {
    ErrorKind::StringErr.with_msg(msg)
}

/// Shorthand for building a [`MissingVal`](ErrorKind::MissingVal) error.
pub fn missing_val(msg: impl Into<String>) -> IppError {
    ErrorKind::MissingVal.with_msg(msg)
}
