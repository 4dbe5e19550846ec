pub mod approvals;
pub mod audit;
pub mod config;
pub mod domain;
pub mod errors;
pub mod masking;

pub use approvals::{
    evaluate, next_status, AggregateOutcome, ApprovalError, RoleContext, TenantPolicy,
};
pub use audit::{AuditEvent, AuditOutcome, AuditSink, AuditSinkError, InMemoryAuditSink};
pub use domain::actor::{Actor, ActorId, ActorRole};
pub use domain::decision::{ApprovalDecision, DecisionValue};
pub use domain::employee::{Employee, EmployeeId, EmployeeLifecycle};
pub use domain::request::{ApprovalRequest, FlowKind, RequestId, RequestStatus};
pub use domain::role::{ApproverRole, Capability, UnknownRole};
pub use domain::tenant::{Tenant, TenantId};
pub use errors::{ApplicationError, InterfaceError};
