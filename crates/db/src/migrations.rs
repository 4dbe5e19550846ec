use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Number of schema versions embedded in this binary. After a successful
/// `run_pending` the database is at exactly this version count.
pub fn embedded_count() -> usize {
    MIGRATOR.iter().filter(|m| m.migration_type.is_up_migration()).count()
}

/// True once the baseline workflow tables exist. Readiness probes use this
/// to distinguish "reachable but never migrated" from "ready".
pub async fn schema_ready(pool: &DbPool) -> Result<bool, MigrateError> {
    let tables: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'approval_request'",
    )
    .fetch_one(pool)
    .await?;
    Ok(tables > 0)
}
