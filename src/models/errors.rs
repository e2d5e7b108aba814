use chrono::{DateTime, Utc};
use thiserror::Error;

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("{store} unavailable during {operation}: {message}")]
    StoreUnavailable {
        store: &'static str,
        operation: String,
        message: String,
    },

    #[error("Meal order for reservation {reservation_id} written without expiry: {message}")]
    ConsistencyGap {
        reservation_id: String,
        message: String,
    },

    #[error("Reservation {reservation_id} already elapsed at {reservation_time}")]
    ReservationElapsed {
        reservation_id: String,
        reservation_time: DateTime<Utc>,
    },

    #[error("Failed to {operation}: {source}")]
    Database {
        operation: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to {operation}: {source}")]
    Cache {
        operation: String,
        #[source]
        source: redis::RedisError,
    },
}

impl RepositoryError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Map a relational store failure, keeping the operation that produced it.
    ///
    /// `RowNotFound` becomes `NotFound`; SQLSTATE classes 22 (data exception)
    /// and 23 (integrity constraint) become `InvalidInput`; transport and pool
    /// failures become `StoreUnavailable`.
    pub fn from_sqlx(
        operation: &str,
        entity: &'static str,
        id: Option<&str>,
        error: sqlx::Error,
    ) -> Self {
        match error {
            sqlx::Error::RowNotFound => RepositoryError::NotFound {
                entity,
                id: id.unwrap_or_default().to_string(),
            },
            sqlx::Error::Database(ref db_error)
                if db_error
                    .code()
                    .map(|code| code.starts_with("22") || code.starts_with("23"))
                    .unwrap_or(false) =>
            {
                RepositoryError::InvalidInput {
                    message: format!("{operation}: {}", db_error.message()),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => RepositoryError::StoreUnavailable {
                store: "postgres",
                operation: operation.to_string(),
                message: error.to_string(),
            },
            other => RepositoryError::Database {
                operation: operation.to_string(),
                source: other,
            },
        }
    }

    /// Map a key-value store failure, keeping the operation that produced it.
    pub fn from_redis(operation: &str, error: redis::RedisError) -> Self {
        if error.is_io_error()
            || error.is_timeout()
            || error.is_connection_dropped()
            || error.is_connection_refusal()
        {
            RepositoryError::StoreUnavailable {
                store: "redis",
                operation: operation.to_string(),
                message: error.to_string(),
            }
        } else {
            RepositoryError::Cache {
                operation: operation.to_string(),
                source: error,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    /// Whether retrying the same call could succeed. Nothing in this crate
    /// retries; the flag is for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RepositoryError::StoreUnavailable { .. } | RepositoryError::ConsistencyGap { .. }
        )
    }
}

/// Validation errors for input data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Invalid field value: {field}={value}, reason={reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field too long: {field}, max_length={max_length}, actual_length={actual_length}")]
    TooLong {
        field: String,
        max_length: usize,
        actual_length: usize,
    },

    #[error("Invalid format: {field}, expected={expected}")]
    InvalidFormat { field: String, expected: String },
}

impl From<ValidationError> for RepositoryError {
    fn from(err: ValidationError) -> Self {
        RepositoryError::InvalidInput {
            message: err.to_string(),
        }
    }
}

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
