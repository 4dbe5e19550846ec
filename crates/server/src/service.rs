//! Application service tying the approval engine to the repositories and
//! the audit sink. Handlers call in here; nothing in this module knows
//! about HTTP.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use hrflow_core::approvals::{
    check_decision, determine_required_roles, evaluate, next_status, ApprovalError, RoleContext,
};
use hrflow_core::audit::{AuditEvent, AuditOutcome, AuditSink};
use hrflow_core::domain::actor::{Actor, ActorId};
use hrflow_core::domain::decision::{ApprovalDecision, DecisionValue};
use hrflow_core::domain::employee::{Employee, EmployeeId, EmployeeLifecycle};
use hrflow_core::domain::request::{ApprovalRequest, FlowKind, RequestId, RequestStatus};
use hrflow_core::domain::role::ApproverRole;
use hrflow_core::domain::tenant::TenantId;
use hrflow_core::errors::ApplicationError;
use hrflow_core::masking::{anonymize_identifier, mask_email, mask_phone};
use hrflow_db::repositories::{
    ApprovalRepository, DecisionWrite, EmployeeRepository, TenantRepository,
};

pub struct CreateRequestInput {
    pub tenant_id: TenantId,
    pub subject_id: EmployeeId,
    pub flow: FlowKind,
    /// Explicit seat assignments. The manager seat falls back to the
    /// subject's manager when absent; every other required seat must be
    /// named here.
    pub approvers: BTreeMap<ApproverRole, ActorId>,
}

/// What one `record_decision` call did to the request state machine.
/// `transitioned` is true only for the call that made the edge, so callers
/// can trigger edge-bound side effects exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecisionOutcome {
    pub previous_status: RequestStatus,
    pub new_status: RequestStatus,
    pub transitioned: bool,
}

pub struct ApprovalService {
    approvals: Arc<dyn ApprovalRepository>,
    employees: Arc<dyn EmployeeRepository>,
    tenants: Arc<dyn TenantRepository>,
    audit: Arc<dyn AuditSink>,
}

fn persistence(error: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

fn new_request_id() -> RequestId {
    RequestId(format!("REQ-{}", &Uuid::new_v4().simple().to_string()[..12]))
}

impl ApprovalService {
    pub fn new(
        approvals: Arc<dyn ApprovalRepository>,
        employees: Arc<dyn EmployeeRepository>,
        tenants: Arc<dyn TenantRepository>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self { approvals, employees, tenants, audit }
    }

    /// Opens a request: derives the role set from tenant policy, freezes it
    /// onto the request, and creates one pending seat per role.
    pub async fn create_request(
        &self,
        input: CreateRequestInput,
        caller: &Actor,
    ) -> Result<ApprovalRequest, ApplicationError> {
        let (_, policy) = self
            .tenants
            .find_by_id(&input.tenant_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| {
                ApprovalError::Validation(format!("unknown tenant `{}`", input.tenant_id.0))
            })?;

        let mut subject = self
            .employees
            .find_by_id(&input.subject_id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| {
                ApprovalError::Validation(format!("unknown employee `{}`", input.subject_id.0))
            })?;

        if subject.tenant_id != input.tenant_id {
            return Err(ApprovalError::Validation(format!(
                "employee `{}` does not belong to tenant `{}`",
                input.subject_id.0, input.tenant_id.0
            ))
            .into());
        }

        match input.flow {
            FlowKind::Offboarding | FlowKind::General => {
                if subject.lifecycle != EmployeeLifecycle::Active {
                    return Err(ApprovalError::Validation(format!(
                        "employee `{}` is not active",
                        subject.id.0
                    ))
                    .into());
                }
            }
            FlowKind::Rehire => {
                if subject.lifecycle != EmployeeLifecycle::Offboarded {
                    return Err(ApprovalError::Validation(format!(
                        "employee `{}` is not offboarded, nothing to rehire",
                        subject.id.0
                    ))
                    .into());
                }
            }
        }

        let roles = determine_required_roles(&RoleContext {
            subject_has_manager: subject.manager_id.is_some(),
            require_ceo_signoff: policy.require_ceo_for(input.flow),
        });

        let now = Utc::now();
        let request = ApprovalRequest {
            id: new_request_id(),
            tenant_id: input.tenant_id.clone(),
            subject_id: subject.id.clone(),
            flow: input.flow,
            status: RequestStatus::Pending,
            required_roles: roles.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut seats = Vec::with_capacity(roles.len());
        for role in &roles {
            let approver = match input.approvers.get(role) {
                Some(approver) => approver.clone(),
                None if *role == ApproverRole::Manager => subject
                    .manager_id
                    .as_ref()
                    .map(|m| ActorId(m.0.clone()))
                    .ok_or_else(|| {
                        ApprovalError::Validation(
                            "manager seat required but subject has no manager".to_string(),
                        )
                    })?,
                None => {
                    return Err(ApprovalError::Validation(format!(
                        "no approver assigned for required role `{role}`"
                    ))
                    .into())
                }
            };
            seats.push(ApprovalDecision::pending(request.id.clone(), *role, approver));
        }

        self.approvals.create_request(&request, &seats).await.map_err(persistence)?;

        if input.flow == FlowKind::Offboarding {
            subject.lifecycle = EmployeeLifecycle::Offboarding;
            subject.updated_at = now;
            self.employees.save(&subject).await.map_err(persistence)?;
        }

        let roles_tag =
            roles.iter().map(ApproverRole::as_str).collect::<Vec<_>>().join(",");
        self.emit(
            AuditEvent::new(
                request.tenant_id.clone(),
                caller.id.clone(),
                "approval.request_created",
                "approval_request",
                request.id.0.clone(),
                AuditOutcome::Success,
            )
            .with_detail("flow", input.flow.as_str())
            .with_detail("required_roles", roles_tag)
            .with_detail("subject_id", subject.id.0.clone()),
        )
        .await?;

        Ok(request)
    }

    /// Records one seat's verdict and, when the aggregate resolves, moves
    /// the request and runs the flow's finalization side effects.
    pub async fn record_decision(
        &self,
        id: &RequestId,
        role: ApproverRole,
        caller: &Actor,
        value: DecisionValue,
        comment: Option<&str>,
    ) -> Result<DecisionOutcome, ApplicationError> {
        let request = self
            .approvals
            .find_request(id)
            .await
            .map_err(persistence)?
            .ok_or(ApprovalError::NotFound)?;
        let decisions = self.approvals.find_decisions(id).await.map_err(persistence)?;
        let seat = decisions.iter().find(|d| d.role == role);

        if let Err(error) = check_decision(&request, seat, caller, value, comment) {
            if error == ApprovalError::Unauthorized {
                self.emit(
                    AuditEvent::new(
                        request.tenant_id.clone(),
                        caller.id.clone(),
                        "approval.decision_rejected",
                        "approval_request",
                        request.id.0.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_detail("role", role.as_str()),
                )
                .await?;
            }
            return Err(error.into());
        }

        let now = Utc::now();
        // The gate above is advisory; this conditional write is what makes
        // the seat move away from `pending` at most once under races.
        match self
            .approvals
            .mark_decision(id, role, value, comment, now)
            .await
            .map_err(persistence)?
        {
            DecisionWrite::Applied => {}
            DecisionWrite::NotPending => return Err(ApprovalError::AlreadyDecided.into()),
        }

        let decisions = self.approvals.find_decisions(id).await.map_err(persistence)?;
        let new_status = next_status(request.status, evaluate(&decisions));
        let transitioned = if new_status != request.status {
            self.approvals.transition_status(id, new_status, now).await.map_err(persistence)?
        } else {
            false
        };

        let mut recorded = AuditEvent::new(
            request.tenant_id.clone(),
            caller.id.clone(),
            "approval.decision_recorded",
            "approval_request",
            request.id.0.clone(),
            AuditOutcome::Success,
        )
        .with_detail("role", role.as_str())
        .with_detail("decision", value.as_str());
        if let Some(comment) = comment {
            recorded = recorded.with_detail("comment", comment);
        }
        self.emit(recorded).await?;

        if transitioned && new_status.is_terminal() {
            let action = match new_status {
                RequestStatus::Approved => "approval.request_approved",
                _ => "approval.request_denied",
            };
            self.emit(
                AuditEvent::new(
                    request.tenant_id.clone(),
                    caller.id.clone(),
                    action,
                    "approval_request",
                    request.id.0.clone(),
                    AuditOutcome::Success,
                )
                .with_detail("flow", request.flow.as_str()),
            )
            .await?;

            if new_status == RequestStatus::Approved {
                self.finalize_approved(&request, caller).await?;
            }
        }

        Ok(DecisionOutcome { previous_status: request.status, new_status, transitioned })
    }

    /// Flow-specific side effects, reached only from the call that made the
    /// approved edge, so each runs once per request.
    async fn finalize_approved(
        &self,
        request: &ApprovalRequest,
        caller: &Actor,
    ) -> Result<(), ApplicationError> {
        let Some(mut subject) =
            self.employees.find_by_id(&request.subject_id).await.map_err(persistence)?
        else {
            return Ok(());
        };

        match request.flow {
            FlowKind::Offboarding => {
                // One-way reference to the pre-masking contact, so the
                // retained audit record can still be joined against
                // external systems without exposing the address.
                let contact_ref = anonymize_identifier(&subject.email);
                subject.lifecycle = EmployeeLifecycle::Offboarded;
                subject.email = mask_email(&subject.email);
                subject.phone = subject.phone.as_deref().map(mask_phone);
                subject.updated_at = Utc::now();
                self.employees.save(&subject).await.map_err(persistence)?;
                self.emit(
                    AuditEvent::new(
                        request.tenant_id.clone(),
                        caller.id.clone(),
                        "employee.offboarded",
                        "employee",
                        subject.id.0.clone(),
                        AuditOutcome::Success,
                    )
                    .with_detail("request_id", request.id.0.clone())
                    .with_detail("contact_ref", contact_ref),
                )
                .await?;
            }
            FlowKind::Rehire => {
                subject.lifecycle = EmployeeLifecycle::Active;
                subject.updated_at = Utc::now();
                self.employees.save(&subject).await.map_err(persistence)?;
                self.emit(
                    AuditEvent::new(
                        request.tenant_id.clone(),
                        caller.id.clone(),
                        "employee.rehired",
                        "employee",
                        subject.id.0.clone(),
                        AuditOutcome::Success,
                    )
                    .with_detail("request_id", request.id.0.clone()),
                )
                .await?;
            }
            FlowKind::General => {}
        }

        Ok(())
    }

    /// Withdraws an open request. The subject, HR, and admins may cancel;
    /// a request that already resolved cannot be.
    pub async fn cancel_request(
        &self,
        id: &RequestId,
        caller: &Actor,
    ) -> Result<ApprovalRequest, ApplicationError> {
        let mut request = self
            .approvals
            .find_request(id)
            .await
            .map_err(persistence)?
            .ok_or(ApprovalError::NotFound)?;

        let may_cancel = caller.role.is_admin()
            || caller.role == hrflow_core::domain::actor::ActorRole::Hr
            || caller.id.0 == request.subject_id.0;
        if !may_cancel {
            return Err(ApprovalError::Unauthorized.into());
        }
        if request.status.is_terminal() {
            return Err(ApprovalError::AlreadyDecided.into());
        }

        let now = Utc::now();
        if !self
            .approvals
            .transition_status(id, RequestStatus::Cancelled, now)
            .await
            .map_err(persistence)?
        {
            // Lost the race against a concurrent decision or cancel.
            return Err(ApprovalError::AlreadyDecided.into());
        }
        request.status = RequestStatus::Cancelled;
        request.updated_at = now;

        self.emit(
            AuditEvent::new(
                request.tenant_id.clone(),
                caller.id.clone(),
                "approval.request_cancelled",
                "approval_request",
                request.id.0.clone(),
                AuditOutcome::Success,
            )
            .with_detail("flow", request.flow.as_str()),
        )
        .await?;

        Ok(request)
    }

    pub async fn get_request(
        &self,
        id: &RequestId,
    ) -> Result<(ApprovalRequest, Vec<ApprovalDecision>), ApplicationError> {
        let request = self
            .approvals
            .find_request(id)
            .await
            .map_err(persistence)?
            .ok_or(ApprovalError::NotFound)?;
        let decisions = self.approvals.find_decisions(id).await.map_err(persistence)?;
        Ok((request, decisions))
    }

    pub async fn list_open(
        &self,
        tenant_id: &TenantId,
        role: Option<ApproverRole>,
    ) -> Result<Vec<ApprovalRequest>, ApplicationError> {
        self.approvals.list_open(tenant_id, role).await.map_err(persistence)
    }

    pub async fn get_employee(
        &self,
        id: &EmployeeId,
    ) -> Result<Employee, ApplicationError> {
        self.employees
            .find_by_id(id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| ApprovalError::NotFound.into())
    }

    async fn emit(&self, event: AuditEvent) -> Result<(), ApplicationError> {
        self.audit.emit(event).await.map_err(persistence)
    }
}
