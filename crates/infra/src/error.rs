use thiserror::Error;

/// Store operation error.
///
/// Infrastructure failures, as opposed to domain errors (validation, policy).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    /// A unique constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A foreign key points at a missing record.
    #[error("missing reference: {0}")]
    MissingReference(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Map a SQLx error, keeping constraint violations distinguishable.
///
/// | SQLx error | Postgres code | StoreError |
/// |---|---|---|
/// | unique violation | `23505` | `Conflict` |
/// | foreign key violation | `23503` | `MissingReference` |
/// | `RowNotFound` | n/a | `NotFound` |
/// | anything else | any | `Backend` |
pub fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::MissingReference(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
