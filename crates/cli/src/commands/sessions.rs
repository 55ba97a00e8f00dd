//! Session maintenance.
//!
//! Sessions expire after seven days of inactivity, but expired rows stay in
//! the table until something deletes them. Run this from cron.
//!
//! ```bash
//! origami-cli sessions prune
//! ```

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tower_sessions::ExpiredDeletion;
use tower_sessions_sqlx_store::PostgresStore;

use super::{DatabaseError, database_url};

/// Delete every expired session.
///
/// # Errors
///
/// Returns an error if the database cannot be reached.
pub async fn prune() -> Result<(), DatabaseError> {
    let database_url = database_url()?;
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    let store = PostgresStore::new(pool);
    store.delete_expired().await?;

    tracing::info!("Expired sessions deleted");
    Ok(())
}
