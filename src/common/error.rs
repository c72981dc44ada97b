//! Error types for minnowdb.

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
/// This is a common Rust pattern (see `std::io::Result`).
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in minnowdb.
///
/// One enum for the whole engine keeps error handling consistent across the
/// cache, storage, and execution layers. Variants carry a human-readable
/// description of what was being looked up or which state rule was broken.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Something that was asked for does not exist: an unknown table id or
    /// name, a page number past the end of a file, `next()` past the last
    /// tuple, an aggregate opened over zero groups, or a delete of a tuple
    /// whose slot is no longer occupied.
    #[error("not found: {0}")]
    NotFound(String),

    /// An operation was called in a state that forbids it, such as an
    /// iterator method on a closed iterator or a string aggregation with an
    /// operator other than COUNT.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Eviction was requested but no resident page exists to evict.
    ///
    /// Only reachable with a cache capacity of zero; signals a
    /// misconfiguration, not a transient condition.
    #[error("storage exhausted: {0}")]
    StorageExhausted(String),

    /// A catalog text line did not match `name (field type [pk], ...)`.
    #[error("malformed catalog entry: {0}")]
    Catalog(String),

    /// I/O error from a page read or write against a table file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::NotFound`] built from a display value.
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Shorthand for a [`Error::InvalidState`] built from a display value.
    pub fn invalid_state(what: impl Into<String>) -> Self {
        Error::InvalidState(what.into())
    }
}
