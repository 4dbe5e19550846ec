use std::sync::Arc;

use hrflow_core::config::{AppConfig, ConfigError, LoadOptions};
use hrflow_db::repositories::{
    SqlApprovalRepository, SqlAuditSink, SqlEmployeeRepository, SqlTenantRepository,
};
use hrflow_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::service::ApprovalService;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: Arc<ApprovalService>,
    pub audit_trail: SqlAuditSink,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let audit_trail = SqlAuditSink::new(db_pool.clone());
    let service = Arc::new(ApprovalService::new(
        Arc::new(SqlApprovalRepository::new(db_pool.clone())),
        Arc::new(SqlEmployeeRepository::new(db_pool.clone())),
        Arc::new(SqlTenantRepository::new(db_pool.clone())),
        Arc::new(audit_trail.clone()),
    ));

    Ok(Application { config, db_pool, service, audit_trail })
}

#[cfg(test)]
mod tests {
    use hrflow_core::config::{ConfigOverrides, LoadOptions};

    use crate::bootstrap::bootstrap;

    fn memory_options() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:?cache=shared".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_connects_and_applies_migrations() {
        let app = bootstrap(memory_options()).await.expect("bootstrap should succeed");

        let (table_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master \
             WHERE type = 'table' AND name IN \
             ('tenant', 'employee', 'approval_request', 'approval_decision', 'audit_log')",
        )
        .fetch_one(&app.db_pool)
        .await
        .expect("expected baseline tables to be available after bootstrap");
        assert_eq!(table_count, 5, "bootstrap should expose the approval-path tables");

        app.db_pool.close().await;
    }
}
