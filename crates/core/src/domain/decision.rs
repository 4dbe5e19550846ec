use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::actor::ActorId;
use crate::domain::request::RequestId;
use crate::domain::role::{ApproverRole, UnknownRole};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionValue {
    Pending,
    Approved,
    Denied,
}

impl DecisionValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionValue::Pending => "pending",
            DecisionValue::Approved => "approved",
            DecisionValue::Denied => "denied",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, DecisionValue::Pending)
    }
}

impl std::str::FromStr for DecisionValue {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(DecisionValue::Pending),
            "approved" | "approve" => Ok(DecisionValue::Approved),
            "denied" | "deny" => Ok(DecisionValue::Denied),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// One row per (request, role) seat, created in bulk when the request is
/// opened and mutated exactly once, from pending to a terminal value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub request_id: RequestId,
    pub role: ApproverRole,
    pub approver_id: ActorId,
    pub value: DecisionValue,
    pub comment: Option<String>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl ApprovalDecision {
    pub fn pending(request_id: RequestId, role: ApproverRole, approver_id: ActorId) -> Self {
        Self {
            request_id,
            role,
            approver_id,
            value: DecisionValue::Pending,
            comment: None,
            decided_at: None,
        }
    }
}
