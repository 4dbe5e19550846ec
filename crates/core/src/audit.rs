use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::actor::ActorId;
use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Rejected,
}

/// Immutable compliance-trail record: who did what to which entity. One
/// event per state change, never one per call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub tenant_id: TenantId,
    pub actor_id: ActorId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: String,
    pub outcome: AuditOutcome,
    pub detail: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(
        tenant_id: TenantId,
        actor_id: ActorId,
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            tenant_id,
            actor_id,
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            outcome,
            detail: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.detail.insert(key.into(), value.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("audit sink failure: {0}")]
pub struct AuditSinkError(pub String);

/// The external audit collaborator. Emission is part of the operation, not
/// fire-and-forget; a failed write surfaces to the caller.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn emit(&self, event: AuditEvent) -> Result<(), AuditSinkError>;
}

#[derive(Clone, Default)]
pub struct InMemoryAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl InMemoryAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn emit(&self, event: AuditEvent) -> Result<(), AuditSinkError> {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditEvent, AuditOutcome, AuditSink, InMemoryAuditSink};
    use crate::domain::actor::ActorId;
    use crate::domain::tenant::TenantId;

    #[tokio::test]
    async fn in_memory_sink_records_events_with_detail() {
        let sink = InMemoryAuditSink::default();
        sink.emit(
            AuditEvent::new(
                TenantId("acme".to_string()),
                ActorId("u-hr".to_string()),
                "approval.request_denied",
                "approval_request",
                "REQ-42",
                AuditOutcome::Success,
            )
            .with_detail("role", "hr")
            .with_detail("comment", "budget exceeded"),
        )
        .await
        .expect("emit");

        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].action, "approval.request_denied");
        assert_eq!(events[0].entity_id, "REQ-42");
        assert_eq!(events[0].detail.get("role").map(String::as_str), Some("hr"));
    }
}
