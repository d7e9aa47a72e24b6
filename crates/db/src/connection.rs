use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use curbreport_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Opens a SQLite pool sized per the database configuration. Every
/// connection gets the pragmas the report store relies on: enforced foreign
/// keys, WAL journaling, and a busy timeout for concurrent writers.
pub async fn connect(database: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(database.max_connections.max(1))
        .acquire_timeout(Duration::from_secs(database.timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(&database.url)
        .await
}
