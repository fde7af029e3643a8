//! Custom error types for the resdata-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum ResdataError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The leading and trailing record length markers disagree, indicating
    /// a corrupt record stream. Not recoverable in place.
    #[error("record length mismatch: leading marker {leading}, trailing marker {trailing}")]
    RecordLengthMismatch { leading: i32, trailing: i32 },

    /// A keyword header carried an element type tag outside the closed set
    /// of known tags.
    #[error("unknown element type tag: {0:?}")]
    UnknownTypeTag(String),

    /// A keyword payload ended before `count * element_size` bytes were read.
    #[error("truncated payload for keyword {keyword}: expected {expected} bytes, found {found}")]
    TruncatedPayload {
        keyword: String,
        expected: u64,
        found: u64,
    },

    /// The stream is structurally invalid or does not conform to the format.
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    /// An index or coordinate outside its valid domain. Recoverable; the
    /// offending value is never clamped.
    #[error("{what} index {index} outside valid range 0..{size}")]
    OutOfRange {
        what: &'static str,
        index: u64,
        size: u64,
    },

    /// An LGR with this name already exists at the same nesting level.
    #[error("duplicate LGR name: {0}")]
    DuplicateName(String),

    /// A parent-cell mapping entry points outside the parent grid.
    #[error("invalid parent mapping for LGR {lgr}: cell {index} outside parent range 0..{parent_size}")]
    InvalidMapping {
        lgr: String,
        index: u32,
        parent_size: u32,
    },

    /// A declared count does not match the number of items actually present.
    #[error("consistency error for {context}: expected {expected}, found {found}")]
    Consistency {
        context: &'static str,
        expected: u64,
        found: u64,
    },

    /// An in-place keyword replacement whose header differs from the on-disk
    /// header at the target offset.
    #[error("in-place replace rejected for keyword {keyword}: on-disk header differs")]
    ReplaceMismatch { keyword: String },

    /// A keyword required by the load sequence was not present.
    #[error("required keyword {0} not present")]
    MissingKeyword(&'static str),

    /// A fault-block trace was started from a cell that does not carry the
    /// requested block id.
    #[error("cell ({i},{j}) does not carry fault block {block_id}")]
    NoSuchBlock { i: u32, j: u32, block_id: i32 },
}

/// A convenience `Result` type alias using the crate's `ResdataError` type.
pub type Result<T> = std::result::Result<T, ResdataError>;
