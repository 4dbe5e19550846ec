use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use hrflow_core::domain::actor::ActorId;
use hrflow_core::domain::decision::{ApprovalDecision, DecisionValue};
use hrflow_core::domain::employee::EmployeeId;
use hrflow_core::domain::request::{ApprovalRequest, FlowKind, RequestId, RequestStatus};
use hrflow_core::domain::role::ApproverRole;
use hrflow_core::domain::tenant::TenantId;

use super::{ApprovalRepository, DecisionWrite, RepositoryError};
use crate::DbPool;

pub struct SqlApprovalRepository {
    pool: DbPool,
}

impl SqlApprovalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn decode<T, E: std::fmt::Display>(result: Result<T, E>) -> Result<T, RepositoryError> {
    result.map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RepositoryError> {
    decode(DateTime::parse_from_rfc3339(raw)).map(|dt| dt.with_timezone(&Utc))
}

fn row_to_request(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalRequest, RepositoryError> {
    let id: String = decode(row.try_get("id"))?;
    let tenant_id: String = decode(row.try_get("tenant_id"))?;
    let subject_id: String = decode(row.try_get("subject_id"))?;
    let flow: String = decode(row.try_get("flow"))?;
    let status: String = decode(row.try_get("status"))?;
    let required_roles: String = decode(row.try_get("required_roles"))?;
    let created_at: String = decode(row.try_get("created_at"))?;
    let updated_at: String = decode(row.try_get("updated_at"))?;

    Ok(ApprovalRequest {
        id: RequestId(id),
        tenant_id: TenantId(tenant_id),
        subject_id: EmployeeId(subject_id),
        flow: decode(flow.parse::<FlowKind>())?,
        status: decode(status.parse::<RequestStatus>())?,
        required_roles: decode(serde_json::from_str::<Vec<ApproverRole>>(&required_roles))?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_decision(row: &sqlx::sqlite::SqliteRow) -> Result<ApprovalDecision, RepositoryError> {
    let request_id: String = decode(row.try_get("request_id"))?;
    let role: String = decode(row.try_get("role"))?;
    let approver_id: String = decode(row.try_get("approver_id"))?;
    let value: String = decode(row.try_get("decision"))?;
    let comment: Option<String> = decode(row.try_get("comment"))?;
    let decided_at: Option<String> = decode(row.try_get("decided_at"))?;

    Ok(ApprovalDecision {
        request_id: RequestId(request_id),
        role: decode(role.parse::<ApproverRole>())?,
        approver_id: ActorId(approver_id),
        value: decode(value.parse::<DecisionValue>())?,
        comment,
        decided_at: decided_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

#[async_trait]
impl ApprovalRepository for SqlApprovalRepository {
    async fn create_request(
        &self,
        request: &ApprovalRequest,
        decisions: &[ApprovalDecision],
    ) -> Result<(), RepositoryError> {
        let required_roles = serde_json::to_string(&request.required_roles)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO approval_request (id, tenant_id, subject_id, flow, status,
                                           required_roles, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&request.id.0)
        .bind(&request.tenant_id.0)
        .bind(&request.subject_id.0)
        .bind(request.flow.as_str())
        .bind(request.status.as_str())
        .bind(&required_roles)
        .bind(request.created_at.to_rfc3339())
        .bind(request.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for decision in decisions {
            sqlx::query(
                "INSERT INTO approval_decision (request_id, role, approver_id, decision, comment, decided_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&decision.request_id.0)
            .bind(decision.role.as_str())
            .bind(&decision.approver_id.0)
            .bind(decision.value.as_str())
            .bind(&decision.comment)
            .bind(decision.decided_at.map(|dt| dt.to_rfc3339()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, subject_id, flow, status, required_roles, created_at, updated_at
             FROM approval_request WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_request(r)?)),
            None => Ok(None),
        }
    }

    async fn find_decisions(
        &self,
        id: &RequestId,
    ) -> Result<Vec<ApprovalDecision>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = sqlx::query(
            "SELECT request_id, role, approver_id, decision, comment, decided_at
             FROM approval_decision WHERE request_id = ? ORDER BY role",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_decision).collect::<Result<Vec<_>, _>>()
    }

    async fn mark_decision(
        &self,
        id: &RequestId,
        role: ApproverRole,
        value: DecisionValue,
        comment: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<DecisionWrite, RepositoryError> {
        // Conditional write, not read-then-write: two racing callers cannot
        // both observe `pending` and both succeed.
        let result = sqlx::query(
            "UPDATE approval_decision
             SET decision = ?, comment = ?, decided_at = ?
             WHERE request_id = ? AND role = ? AND decision = 'pending'",
        )
        .bind(value.as_str())
        .bind(comment)
        .bind(decided_at.to_rfc3339())
        .bind(&id.0)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(DecisionWrite::NotPending)
        } else {
            Ok(DecisionWrite::Applied)
        }
    }

    async fn transition_status(
        &self,
        id: &RequestId,
        to: RequestStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE approval_request
             SET status = ?, updated_at = ?
             WHERE id = ? AND status IN ('pending', 'in_review') AND status <> ?",
        )
        .bind(to.as_str())
        .bind(updated_at.to_rfc3339())
        .bind(&id.0)
        .bind(to.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_open(
        &self,
        tenant_id: &TenantId,
        role: Option<ApproverRole>,
    ) -> Result<Vec<ApprovalRequest>, RepositoryError> {
        let rows: Vec<sqlx::sqlite::SqliteRow> = if let Some(role) = role {
            sqlx::query(
                "SELECT r.id, r.tenant_id, r.subject_id, r.flow, r.status, r.required_roles,
                        r.created_at, r.updated_at
                 FROM approval_request r
                 JOIN approval_decision d ON d.request_id = r.id
                 WHERE r.tenant_id = ? AND r.status IN ('pending', 'in_review')
                   AND d.role = ? AND d.decision = 'pending'
                 ORDER BY r.created_at ASC",
            )
            .bind(&tenant_id.0)
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                "SELECT id, tenant_id, subject_id, flow, status, required_roles,
                        created_at, updated_at
                 FROM approval_request
                 WHERE tenant_id = ? AND status IN ('pending', 'in_review')
                 ORDER BY created_at ASC",
            )
            .bind(&tenant_id.0)
            .fetch_all(&self.pool)
            .await?
        };

        rows.iter().map(row_to_request).collect::<Result<Vec<_>, _>>()
    }
}
