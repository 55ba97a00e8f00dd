//! CLI command implementations.

pub mod api;
pub mod migrate;
pub mod sessions;

use secrecy::SecretString;

/// Errors shared by the commands that touch the session database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Session store error.
    #[error("Session store error: {0}")]
    Store(#[from] tower_sessions::session_store::Error),
}

/// `ORIGAMI_DATABASE_URL`, falling back to `DATABASE_URL`.
pub(crate) fn database_url() -> Result<SecretString, DatabaseError> {
    dotenvy::dotenv().ok();

    std::env::var("ORIGAMI_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| DatabaseError::MissingEnvVar("ORIGAMI_DATABASE_URL"))
}
