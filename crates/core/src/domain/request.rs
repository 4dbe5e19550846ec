use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::employee::EmployeeId;
use crate::domain::role::{ApproverRole, UnknownRole};
use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

/// The workflows that share the aggregation engine. Per-flow differences
/// live entirely in role-set policy at creation time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Offboarding,
    Rehire,
    General,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InReview,
    Approved,
    Denied,
    Cancelled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InReview => "in_review",
            RequestStatus::Approved => "approved",
            RequestStatus::Denied => "denied",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::Denied | RequestStatus::Cancelled)
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(RequestStatus::Pending),
            "in_review" => Ok(RequestStatus::InReview),
            "approved" => Ok(RequestStatus::Approved),
            "denied" => Ok(RequestStatus::Denied),
            "cancelled" => Ok(RequestStatus::Cancelled),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Offboarding => "offboarding",
            FlowKind::Rehire => "rehire",
            FlowKind::General => "general",
        }
    }
}

impl std::str::FromStr for FlowKind {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "offboarding" => Ok(FlowKind::Offboarding),
            "rehire" => Ok(FlowKind::Rehire),
            "general" => Ok(FlowKind::General),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// One workflow instance. `required_roles` is the policy snapshot taken at
/// creation; decision-time code never consults live tenant policy, so a
/// mid-flight policy change cannot orphan a seat.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: RequestId,
    pub tenant_id: TenantId,
    pub subject_id: EmployeeId,
    pub flow: FlowKind,
    pub status: RequestStatus,
    pub required_roles: Vec<ApproverRole>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::RequestStatus;

    #[test]
    fn terminal_states_are_exactly_the_last_three() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(!RequestStatus::InReview.is_terminal());
        assert!(RequestStatus::Approved.is_terminal());
        assert!(RequestStatus::Denied.is_terminal());
        assert!(RequestStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_round_trips_through_wire_form() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::InReview,
            RequestStatus::Approved,
            RequestStatus::Denied,
            RequestStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<RequestStatus>(), Ok(status));
        }
    }
}
