use serde::{Deserialize, Serialize};

use crate::domain::request::FlowKind;
use crate::domain::role::ApproverRole;

/// Per-tenant approval policy as stored. Consulted once, at request
/// creation; the derived role set is frozen onto the request so a later
/// policy change cannot add a seat nobody will ever fill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantPolicy {
    pub require_ceo_offboarding: bool,
    pub require_ceo_rehire: bool,
}

impl Default for TenantPolicy {
    fn default() -> Self {
        Self { require_ceo_offboarding: false, require_ceo_rehire: false }
    }
}

impl TenantPolicy {
    pub fn require_ceo_for(&self, flow: FlowKind) -> bool {
        match flow {
            FlowKind::Offboarding => self.require_ceo_offboarding,
            FlowKind::Rehire => self.require_ceo_rehire,
            FlowKind::General => false,
        }
    }
}

/// Everything role derivation may look at. Building this from the subject
/// and the tenant policy is the caller's job; deriving roles from it is
/// deterministic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleContext {
    pub subject_has_manager: bool,
    pub require_ceo_signoff: bool,
}

/// HR always has a seat; the immediate manager when one exists; the CEO
/// when policy demands it for this flow.
pub fn determine_required_roles(ctx: &RoleContext) -> Vec<ApproverRole> {
    let mut roles = Vec::with_capacity(3);
    if ctx.subject_has_manager {
        roles.push(ApproverRole::Manager);
    }
    roles.push(ApproverRole::Hr);
    if ctx.require_ceo_signoff {
        roles.push(ApproverRole::Ceo);
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::{determine_required_roles, RoleContext, TenantPolicy};
    use crate::domain::request::FlowKind;
    use crate::domain::role::ApproverRole;

    #[test]
    fn hr_is_always_required() {
        let roles = determine_required_roles(&RoleContext {
            subject_has_manager: false,
            require_ceo_signoff: false,
        });
        assert_eq!(roles, vec![ApproverRole::Hr]);
    }

    #[test]
    fn manager_and_ceo_join_when_context_demands() {
        let roles = determine_required_roles(&RoleContext {
            subject_has_manager: true,
            require_ceo_signoff: true,
        });
        assert_eq!(roles, vec![ApproverRole::Manager, ApproverRole::Hr, ApproverRole::Ceo]);
    }

    #[test]
    fn same_context_always_yields_the_same_role_set() {
        let ctx = RoleContext { subject_has_manager: true, require_ceo_signoff: false };
        assert_eq!(determine_required_roles(&ctx), determine_required_roles(&ctx));
    }

    #[test]
    fn general_flow_never_requires_the_ceo() {
        let policy = TenantPolicy { require_ceo_offboarding: true, require_ceo_rehire: true };
        assert!(policy.require_ceo_for(FlowKind::Offboarding));
        assert!(policy.require_ceo_for(FlowKind::Rehire));
        assert!(!policy.require_ceo_for(FlowKind::General));
    }
}
