use std::num::ParseIntError;

use thiserror::Error;

/// Errors that can occur while configuring or creating the database pool.
#[derive(Debug, Error)]
pub enum DbConnectionError {
    #[error("environment variable {0} is missing")]
    MissingEnvVar(String),
    #[error("database url cannot be empty")]
    EmptyDatabaseUrl,
    #[error("environment variable {0} contains invalid unicode")]
    InvalidUnicode(String),
    #[error("failed to parse numeric environment variable {var}: {source}")]
    InvalidNumber {
        var: String,
        #[source]
        source: ParseIntError,
    },
    #[error("invalid value for {var}: {reason}")]
    InvalidValue { var: String, reason: String },
    #[error("file/directory creation error: {0}")]
    FileCreation(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
