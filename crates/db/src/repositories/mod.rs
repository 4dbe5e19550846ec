use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use hrflow_core::approvals::TenantPolicy;
use hrflow_core::domain::decision::{ApprovalDecision, DecisionValue};
use hrflow_core::domain::employee::{Employee, EmployeeId};
use hrflow_core::domain::request::{ApprovalRequest, RequestId, RequestStatus};
use hrflow_core::domain::role::ApproverRole;
use hrflow_core::domain::tenant::{Tenant, TenantId};

pub mod approval;
pub mod audit;
pub mod employee;
pub mod memory;
pub mod tenant;

pub use approval::SqlApprovalRepository;
pub use audit::SqlAuditSink;
pub use employee::SqlEmployeeRepository;
pub use memory::{InMemoryApprovalRepository, InMemoryEmployeeRepository, InMemoryTenantRepository};
pub use tenant::SqlTenantRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result of the conditional decision write. `NotPending` covers both a
/// double submission and a lost race; the caller cannot tell them apart and
/// does not need to, both surface as `AlreadyDecided`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionWrite {
    Applied,
    NotPending,
}

#[async_trait]
pub trait ApprovalRepository: Send + Sync {
    /// Inserts the request and its decision seats atomically.
    async fn create_request(
        &self,
        request: &ApprovalRequest,
        decisions: &[ApprovalDecision],
    ) -> Result<(), RepositoryError>;

    async fn find_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError>;

    async fn find_decisions(
        &self,
        id: &RequestId,
    ) -> Result<Vec<ApprovalDecision>, RepositoryError>;

    /// Single conditional write: the seat moves away from `pending` at most
    /// once, no matter how many callers race on it.
    async fn mark_decision(
        &self,
        id: &RequestId,
        role: ApproverRole,
        value: DecisionValue,
        comment: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<DecisionWrite, RepositoryError>;

    /// Conditional status move; returns whether this call made the edge.
    /// A request already terminal, or already at `to`, is left untouched.
    async fn transition_status(
        &self,
        id: &RequestId,
        to: RequestStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;

    /// Open requests for a tenant, optionally narrowed to those still
    /// waiting on a given role's seat.
    async fn list_open(
        &self,
        tenant_id: &TenantId,
        role: Option<ApproverRole>,
    ) -> Result<Vec<ApprovalRequest>, RepositoryError>;
}

#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError>;
    async fn save(&self, employee: &Employee) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &TenantId,
    ) -> Result<Option<(Tenant, TenantPolicy)>, RepositoryError>;
    async fn save(&self, tenant: &Tenant, policy: &TenantPolicy) -> Result<(), RepositoryError>;
}
