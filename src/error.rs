// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Error types shared by the tree and the log.

use thiserror::Error;

/// Result type alias for grouplog operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An index or offset lies outside the structural bounds of the tree,
    /// or past the end of the visible rows.
    #[error("index {index} out of range (bound {bound})")]
    OutOfRange { index: u64, bound: u64 },

    /// A group or entry index that does not exist.
    #[error("{what} {index} not found ({len} present)")]
    NotFound {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// An appended entry is older than the entry stored before it.
    #[error("entry {index} at time {time} precedes stored time {previous}")]
    OrderViolation { index: usize, time: f64, previous: f64 },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn group_not_found(index: usize, len: usize) -> Error {
        return Error::NotFound { what: "group", index, len };
    }

    pub(crate) fn entry_not_found(index: usize, len: usize) -> Error {
        return Error::NotFound { what: "entry", index, len };
    }
}
