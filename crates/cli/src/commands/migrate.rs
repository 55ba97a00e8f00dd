//! Database migration command.
//!
//! The storefront keeps only visitor sessions in `PostgreSQL`; the
//! `tower_sessions` schema and table are owned by
//! `tower-sessions-sqlx-store`, which creates them idempotently.
//!
//! # Usage
//!
//! ```bash
//! origami-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `ORIGAMI_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

use super::{DatabaseError, database_url};

/// Create the session table if it does not exist.
///
/// # Errors
///
/// Returns an error if the URL is missing or the database refuses the DDL.
pub async fn run() -> Result<(), DatabaseError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Creating session table...");
    PostgresStore::new(pool).migrate().await?;

    tracing::info!("Migrations complete");
    Ok(())
}
