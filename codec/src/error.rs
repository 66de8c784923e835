//! Error types for codec operations

use thiserror::Error;

/// Error type for codec operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A read asked for more bytes than are currently buffered.
    ///
    /// This is the only recoverable error: append more bytes and retry.
    #[error("not enough data: requested {requested} bytes, {available} available")]
    NotEnoughData { requested: usize, available: usize },
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("size mismatch: expected {expected} but found {found}")]
    SizeMismatch { expected: usize, found: usize },
    #[error("incorrect length of an array: consumed {consumed} of {budget} bytes")]
    ArrayOverrun { budget: usize, consumed: usize },
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String), // codec, message
    #[error("invalid data in {0}: {1}")]
    InvalidData(&'static str, String), // context, message
    #[error("invalid length: {0}")]
    InvalidLength(usize),
    #[error("buffer underrun: requested {requested} bytes, {available} available")]
    Underrun { requested: usize, available: usize },
}

impl Error {
    /// Returns true if the error only means that more input is needed.
    pub fn is_not_enough_data(&self) -> bool {
        matches!(self, Error::NotEnoughData { .. })
    }
}
