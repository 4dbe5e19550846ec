pub mod engine;
pub mod policy;

pub use engine::{check_decision, evaluate, next_status, AggregateOutcome, ApprovalError};
pub use policy::{determine_required_roles, RoleContext, TenantPolicy};
