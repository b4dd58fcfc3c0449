use thiserror::Error;

/// Core error type shared across Seedwright crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error or catalog query failure.
    #[error("database error: {0}")]
    Db(String),
    /// The schema snapshot violates internal invariants.
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    /// A requested feature is not yet supported.
    #[error("unsupported: {0}")]
    Unsupported(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by Seedwright crates.
pub type Result<T> = std::result::Result<T, Error>;
