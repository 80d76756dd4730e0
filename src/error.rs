// Error taxonomy
// Every operation failure is one of four recoverable cases; handlers turn
// them into user-visible notices instead of 500s.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Required input missing or unparseable before the store is touched.
    #[error("{0}")]
    Validation(String),

    /// Create attempted with a fighter id that already exists.
    #[error("fighter id {0} already exists")]
    DuplicateId(i64),

    /// Edit lookup matched no record.
    #[error("fighter not found")]
    NotFound,

    /// Any other store failure (connectivity, syntax, constraint other
    /// than the duplicate-id case).
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
