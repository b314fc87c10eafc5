//! Error types for the B+ tree index.

use thiserror::Error;

use crate::common::Key;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in the index.
///
/// Precondition errors (`NotInitialized`, `AlreadyInitialized`,
/// `InvalidOrder`, `InvalidRange`) are raised before any node is touched, so
/// the tree is left exactly as it was. `Corrupted` is fatal.
#[derive(Debug, Error)]
pub enum Error {
    /// An operation was issued before `initialize`.
    #[error("B+ tree has not been initialized")]
    NotInitialized,

    /// `initialize` was called on an index that already holds a tree.
    #[error("B+ tree is already initialized")]
    AlreadyInitialized,

    /// The branching factor is too small for `MIN >= 1`.
    #[error("invalid order {order}: must be at least 3")]
    InvalidOrder { order: i64 },

    /// A range query with `low > high`.
    #[error("invalid range: low {low} > high {high}")]
    InvalidRange { low: Key, high: Key },

    /// A driver instruction with an unknown verb or the wrong arity.
    #[error("malformed instruction: {reason}")]
    MalformedCommand { reason: String },

    /// A driver token that is not a valid key or value.
    #[error("invalid number: {token:?}")]
    InvalidNumber { token: String },

    /// A structural invariant is broken.
    ///
    /// This indicates a bug - a well-formed tree never reaches it.
    #[error("internal consistency failure: {reason}")]
    Corrupted { reason: String },

    /// An earlier `Corrupted` error disabled the index.
    #[error("B+ tree is poisoned by an earlier consistency failure")]
    Poisoned,

    /// I/O error from the command driver.
    ///
    /// The engine itself never performs I/O.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `Corrupted` error from anything displayable.
    pub(crate) fn corrupted(reason: impl Into<String>) -> Self {
        Error::Corrupted {
            reason: reason.into(),
        }
    }

    /// Whether this error leaves the tree unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Corrupted { .. } | Error::Poisoned)
    }
}
