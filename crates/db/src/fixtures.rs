//! Deterministic demo dataset for local development and smoke checks.

use chrono::{TimeZone, Utc};
use serde::Serialize;

use hrflow_core::approvals::TenantPolicy;
use hrflow_core::domain::actor::ActorId;
use hrflow_core::domain::decision::ApprovalDecision;
use hrflow_core::domain::employee::{Employee, EmployeeId, EmployeeLifecycle};
use hrflow_core::domain::request::{ApprovalRequest, FlowKind, RequestId, RequestStatus};
use hrflow_core::domain::role::ApproverRole;
use hrflow_core::domain::tenant::{Tenant, TenantId};

use crate::repositories::{
    ApprovalRepository, EmployeeRepository, RepositoryError, SqlApprovalRepository,
    SqlEmployeeRepository, SqlTenantRepository, TenantRepository,
};
use crate::DbPool;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeedResult {
    pub tenants: u32,
    pub employees: u32,
    pub requests: u32,
    pub decisions: u32,
}

const SEED_TENANT: &str = "demo-tenant";

/// Idempotent: re-seeding over an already-seeded database overwrites the
/// same fixed identifiers rather than duplicating them.
pub async fn seed_demo_data(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
    let seeded_at = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).single().unwrap_or_else(Utc::now);
    let mut result = SeedResult::default();

    let tenants = SqlTenantRepository::new(pool.clone());
    tenants
        .save(
            &Tenant {
                id: TenantId(SEED_TENANT.to_string()),
                name: "Demo Tenant".to_string(),
                created_at: seeded_at,
            },
            &TenantPolicy { require_ceo_offboarding: true, require_ceo_rehire: false },
        )
        .await?;
    result.tenants += 1;

    let employees = SqlEmployeeRepository::new(pool.clone());
    let people: [(&str, &str, &str, Option<&str>); 4] = [
        ("demo-ceo", "Dana Chief", "dana.chief@demo.test", None),
        ("demo-hr", "Harper Reyes", "harper.reyes@demo.test", Some("demo-ceo")),
        ("demo-mgr", "Morgan Lee", "morgan.lee@demo.test", Some("demo-ceo")),
        ("demo-emp", "Jordan Park", "jordan.park@demo.test", Some("demo-mgr")),
    ];
    for (id, name, email, manager) in people {
        employees
            .save(&Employee {
                id: EmployeeId(id.to_string()),
                tenant_id: TenantId(SEED_TENANT.to_string()),
                full_name: name.to_string(),
                email: email.to_string(),
                phone: Some("+1 555 010 0001".to_string()),
                manager_id: manager.map(|m| EmployeeId(m.to_string())),
                lifecycle: EmployeeLifecycle::Active,
                created_at: seeded_at,
                updated_at: seeded_at,
            })
            .await?;
        result.employees += 1;
    }

    let approvals = SqlApprovalRepository::new(pool.clone());
    let request_id = RequestId("demo-offboarding-1".to_string());
    if approvals.find_request(&request_id).await?.is_none() {
        let roles = vec![ApproverRole::Manager, ApproverRole::Hr, ApproverRole::Ceo];
        let request = ApprovalRequest {
            id: request_id.clone(),
            tenant_id: TenantId(SEED_TENANT.to_string()),
            subject_id: EmployeeId("demo-emp".to_string()),
            flow: FlowKind::Offboarding,
            status: RequestStatus::Pending,
            required_roles: roles.clone(),
            created_at: seeded_at,
            updated_at: seeded_at,
        };
        let approver_for = |role: ApproverRole| match role {
            ApproverRole::Manager => "demo-mgr",
            ApproverRole::Hr => "demo-hr",
            ApproverRole::Ceo => "demo-ceo",
        };
        let decisions: Vec<ApprovalDecision> = roles
            .iter()
            .map(|role| {
                ApprovalDecision::pending(
                    request_id.clone(),
                    *role,
                    ActorId(approver_for(*role).to_string()),
                )
            })
            .collect();
        approvals.create_request(&request, &decisions).await?;
        result.requests += 1;
        result.decisions += decisions.len() as u32;
    }

    Ok(result)
}
