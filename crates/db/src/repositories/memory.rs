use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use hrflow_core::approvals::TenantPolicy;
use hrflow_core::domain::decision::{ApprovalDecision, DecisionValue};
use hrflow_core::domain::employee::{Employee, EmployeeId};
use hrflow_core::domain::request::{ApprovalRequest, RequestId, RequestStatus};
use hrflow_core::domain::role::ApproverRole;
use hrflow_core::domain::tenant::{Tenant, TenantId};

use super::{
    ApprovalRepository, DecisionWrite, EmployeeRepository, RepositoryError, TenantRepository,
};

/// Test double mirroring the SQL repository's conditional-write semantics;
/// the single write lock plays the part of row-level locking.
#[derive(Default)]
pub struct InMemoryApprovalRepository {
    requests: RwLock<HashMap<String, (ApprovalRequest, Vec<ApprovalDecision>)>>,
}

#[async_trait]
impl ApprovalRepository for InMemoryApprovalRepository {
    async fn create_request(
        &self,
        request: &ApprovalRequest,
        decisions: &[ApprovalDecision],
    ) -> Result<(), RepositoryError> {
        let mut requests = self.requests.write().await;
        requests.insert(request.id.0.clone(), (request.clone(), decisions.to_vec()));
        Ok(())
    }

    async fn find_request(
        &self,
        id: &RequestId,
    ) -> Result<Option<ApprovalRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id.0).map(|(request, _)| request.clone()))
    }

    async fn find_decisions(
        &self,
        id: &RequestId,
    ) -> Result<Vec<ApprovalDecision>, RepositoryError> {
        let requests = self.requests.read().await;
        Ok(requests.get(&id.0).map(|(_, decisions)| decisions.clone()).unwrap_or_default())
    }

    async fn mark_decision(
        &self,
        id: &RequestId,
        role: ApproverRole,
        value: DecisionValue,
        comment: Option<&str>,
        decided_at: DateTime<Utc>,
    ) -> Result<DecisionWrite, RepositoryError> {
        let mut requests = self.requests.write().await;
        let Some((_, decisions)) = requests.get_mut(&id.0) else {
            return Ok(DecisionWrite::NotPending);
        };
        let Some(decision) =
            decisions.iter_mut().find(|d| d.role == role && d.value == DecisionValue::Pending)
        else {
            return Ok(DecisionWrite::NotPending);
        };
        decision.value = value;
        decision.comment = comment.map(str::to_string);
        decision.decided_at = Some(decided_at);
        Ok(DecisionWrite::Applied)
    }

    async fn transition_status(
        &self,
        id: &RequestId,
        to: RequestStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut requests = self.requests.write().await;
        let Some((request, _)) = requests.get_mut(&id.0) else { return Ok(false) };
        if request.status.is_terminal() || request.status == to {
            return Ok(false);
        }
        request.status = to;
        request.updated_at = updated_at;
        Ok(true)
    }

    async fn list_open(
        &self,
        tenant_id: &TenantId,
        role: Option<ApproverRole>,
    ) -> Result<Vec<ApprovalRequest>, RepositoryError> {
        let requests = self.requests.read().await;
        let mut open: Vec<ApprovalRequest> = requests
            .values()
            .filter(|(request, _)| &request.tenant_id == tenant_id)
            .filter(|(request, _)| !request.status.is_terminal())
            .filter(|(_, decisions)| match role {
                Some(role) => decisions
                    .iter()
                    .any(|d| d.role == role && d.value == DecisionValue::Pending),
                None => true,
            })
            .map(|(request, _)| request.clone())
            .collect();
        open.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(open)
    }
}

#[derive(Default)]
pub struct InMemoryEmployeeRepository {
    employees: RwLock<HashMap<String, Employee>>,
}

#[async_trait]
impl EmployeeRepository for InMemoryEmployeeRepository {
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let employees = self.employees.read().await;
        Ok(employees.get(&id.0).cloned())
    }

    async fn save(&self, employee: &Employee) -> Result<(), RepositoryError> {
        let mut employees = self.employees.write().await;
        employees.insert(employee.id.0.clone(), employee.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryTenantRepository {
    tenants: RwLock<HashMap<String, (Tenant, TenantPolicy)>>,
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_id(
        &self,
        id: &TenantId,
    ) -> Result<Option<(Tenant, TenantPolicy)>, RepositoryError> {
        let tenants = self.tenants.read().await;
        Ok(tenants.get(&id.0).cloned())
    }

    async fn save(&self, tenant: &Tenant, policy: &TenantPolicy) -> Result<(), RepositoryError> {
        let mut tenants = self.tenants.write().await;
        tenants.insert(tenant.id.0.clone(), (tenant.clone(), policy.clone()));
        Ok(())
    }
}
