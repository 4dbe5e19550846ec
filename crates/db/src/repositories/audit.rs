use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use hrflow_core::audit::{AuditEvent, AuditOutcome, AuditSink, AuditSinkError};
use hrflow_core::domain::actor::ActorId;
use hrflow_core::domain::tenant::TenantId;

use super::RepositoryError;
use crate::DbPool;

/// Durable audit collaborator. Rows are append-only; there is no update or
/// delete path on this table.
#[derive(Clone)]
pub struct SqlAuditSink {
    pool: DbPool,
}

impl SqlAuditSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_entity(
        &self,
        entity_type: &str,
        entity_id: &str,
    ) -> Result<Vec<AuditEvent>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT event_id, tenant_id, actor_id, action, entity_type, entity_id,
                    outcome, detail, occurred_at
             FROM audit_log
             WHERE entity_type = ? AND entity_id = ?
             ORDER BY occurred_at ASC",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_event).collect::<Result<Vec<_>, _>>()
    }
}

fn row_to_event(row: &sqlx::sqlite::SqliteRow) -> Result<AuditEvent, RepositoryError> {
    let event_id: String =
        row.try_get("event_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let actor_id: String =
        row.try_get("actor_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let action: String =
        row.try_get("action").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let entity_type: String =
        row.try_get("entity_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let entity_id: String =
        row.try_get("entity_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let outcome: String =
        row.try_get("outcome").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let detail: String =
        row.try_get("detail").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let occurred_at: String =
        row.try_get("occurred_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let outcome = match outcome.as_str() {
        "success" => AuditOutcome::Success,
        "rejected" => AuditOutcome::Rejected,
        other => return Err(RepositoryError::Decode(format!("unknown audit outcome `{other}`"))),
    };

    Ok(AuditEvent {
        event_id,
        tenant_id: TenantId(tenant_id),
        actor_id: ActorId(actor_id),
        action,
        entity_type,
        entity_id,
        outcome,
        detail: serde_json::from_str::<BTreeMap<String, String>>(&detail)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        occurred_at: DateTime::parse_from_rfc3339(&occurred_at)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl AuditSink for SqlAuditSink {
    async fn emit(&self, event: AuditEvent) -> Result<(), AuditSinkError> {
        let detail = serde_json::to_string(&event.detail)
            .map_err(|error| AuditSinkError(error.to_string()))?;
        let outcome = match event.outcome {
            AuditOutcome::Success => "success",
            AuditOutcome::Rejected => "rejected",
        };

        sqlx::query(
            "INSERT INTO audit_log (event_id, tenant_id, actor_id, action, entity_type,
                                    entity_id, outcome, detail, occurred_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&event.event_id)
        .bind(&event.tenant_id.0)
        .bind(&event.actor_id.0)
        .bind(&event.action)
        .bind(&event.entity_type)
        .bind(&event.entity_id)
        .bind(outcome)
        .bind(&detail)
        .bind(event.occurred_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|error| AuditSinkError(error.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hrflow_core::audit::{AuditEvent, AuditOutcome, AuditSink};
    use hrflow_core::domain::actor::ActorId;
    use hrflow_core::domain::tenant::TenantId;

    use super::SqlAuditSink;
    use crate::{connect_with_settings, migrations};

    fn event(action: &str, entity_id: &str) -> AuditEvent {
        AuditEvent::new(
            TenantId("acme".to_string()),
            ActorId("u-hr".to_string()),
            action,
            "approval_request",
            entity_id,
            AuditOutcome::Success,
        )
        .with_detail("role", "hr")
    }

    #[tokio::test]
    async fn emitted_events_are_listed_in_order_for_their_entity() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let sink = SqlAuditSink::new(pool);
        sink.emit(event("approval.request_created", "REQ-1")).await.expect("emit 1");
        sink.emit(event("approval.decision_recorded", "REQ-1")).await.expect("emit 2");
        sink.emit(event("approval.request_created", "REQ-2")).await.expect("emit other");

        let trail = sink.list_for_entity("approval_request", "REQ-1").await.expect("list");
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[0].action, "approval.request_created");
        assert_eq!(trail[1].action, "approval.decision_recorded");
        assert_eq!(trail[1].detail.get("role").map(String::as_str), Some("hr"));
    }
}
