use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use curbreport_core::config::DatabaseConfig;

    use super::run_pending;
    use crate::connect;

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "reports",
        "idx_reports_user_id",
        "idx_reports_violation_type",
        "idx_reports_lat_lon",
    ];

    // In-memory SQLite gives every pooled connection its own database, so
    // tests pin the pool to a single connection.
    fn memory_database() -> DatabaseConfig {
        DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn migrations_create_the_report_schema() {
        let pool = connect(&memory_database()).await.unwrap();
        run_pending(&pool).await.unwrap();

        for object in MANAGED_SCHEMA_OBJECTS {
            let row = sqlx::query(
                "SELECT COUNT(*) AS present FROM sqlite_master WHERE name = ?1",
            )
            .bind(object)
            .fetch_one(&pool)
            .await
            .unwrap();
            let present: i64 = row.try_get("present").unwrap();
            assert_eq!(present, 1, "missing schema object `{object}`");
        }
    }

    #[tokio::test]
    async fn migrations_are_idempotent() {
        let pool = connect(&memory_database()).await.unwrap();
        run_pending(&pool).await.unwrap();
        run_pending(&pool).await.unwrap();
    }
}
