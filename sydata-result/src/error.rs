use std::{fmt, io};
use thiserror::Error;

/// Unified error type for all sydata operations.
///
/// Errors are raised synchronously to the immediate caller. There is no retry
/// layer and no rollback: a failed writeback or transfer may leave its
/// destination partially written.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Arrow error while building, casting or filtering column arrays.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Invalid user input or API parameter.
    ///
    /// Covers malformed type strings and URLs, out-of-range row indices,
    /// unsupported column data types and oversized attributes.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// A named entry (group child, column, attribute, file) does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A container type tag has no container implementation.
    ///
    /// Raised at dispatch time by the factory, e.g. for `Function` and
    /// `Generic` tags.
    #[error("unsupported container type: {0}")]
    UnsupportedType(String),

    /// The operation is not permitted by the access mode.
    ///
    /// Mutating a read-through list, random access mutation on a write-through
    /// list, constructing a write-through list over a non-empty target,
    /// writing to a read-only file or linking between tables that do not
    /// permit it.
    #[error("mode violation: {0}")]
    ModeViolation(String),

    /// A structural invariant would be broken.
    ///
    /// Column length against the table's established row count,
    /// multi-dimensional column data, and content type mismatches on
    /// append/extend.
    #[error("consistency error: {0}")]
    ConsistencyError(String),

    /// The persistent pager backend reported a failure.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Compression, decompression or node decoding failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// Internal error indicating a bug or unexpected state.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Build the type-assertion error raised when an item's container type does
    /// not match the container's declared content type.
    ///
    /// ```
    /// use sydata_result::Error;
    ///
    /// let err = Error::content_type_mismatch("[table]", "text");
    /// assert!(matches!(&err, Error::ConsistencyError(msg) if msg.contains("[table]")));
    /// ```
    pub fn content_type_mismatch(expected: impl fmt::Display, actual: impl fmt::Display) -> Self {
        Error::ConsistencyError(format!(
            "content type mismatch: expected {expected}, got {actual}"
        ))
    }

    /// Build a mode violation for `operation` on a container or file in `mode`.
    #[inline]
    pub fn mode_violation(operation: &str, mode: impl fmt::Display) -> Self {
        Error::ModeViolation(format!("{operation} is not permitted in {mode} mode"))
    }

    /// Wrap a pager backend failure.
    #[inline]
    pub fn backend<E: fmt::Display>(err: E) -> Self {
        Error::Backend(err.to_string())
    }

    /// Wrap a codec failure.
    #[inline]
    pub fn codec<E: fmt::Display>(err: E) -> Self {
        Error::Codec(err.to_string())
    }

    /// Build a not-found error for a named entry.
    #[inline]
    pub fn not_found(what: impl fmt::Display) -> Self {
        Error::NotFound(what.to_string())
    }
}
