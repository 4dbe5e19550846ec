//! Aggregation of per-role decisions into one request-level outcome.
//!
//! The rule is AND-with-early-exit: a single denial is final regardless of
//! other pending seats; approval requires every seat. There is no quorum or
//! weighted variant. All functions here are pure; the conditional writes
//! that make the rule safe under concurrency live in the repository layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::actor::Actor;
use crate::domain::decision::{ApprovalDecision, DecisionValue};
use crate::domain::request::{ApprovalRequest, RequestStatus};

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApprovalError {
    #[error("approval request or decision row not found")]
    NotFound,
    #[error("decision already recorded or request already terminal")]
    AlreadyDecided,
    #[error("caller is not the assigned approver for this role")]
    Unauthorized,
    #[error("validation failed: {0}")]
    Validation(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateOutcome {
    Approved,
    Denied,
    StillOpen,
}

/// Commutative aggregation over the full decision set. Submission order
/// cannot change the result.
pub fn evaluate(decisions: &[ApprovalDecision]) -> AggregateOutcome {
    if decisions.iter().any(|d| d.value == DecisionValue::Denied) {
        return AggregateOutcome::Denied;
    }
    if decisions.iter().all(|d| d.value == DecisionValue::Approved) {
        return AggregateOutcome::Approved;
    }
    AggregateOutcome::StillOpen
}

/// Maps an aggregate outcome onto the request state machine. While the
/// aggregate is still open the only movement is pending -> in_review on the
/// first recorded decision.
pub fn next_status(current: RequestStatus, outcome: AggregateOutcome) -> RequestStatus {
    match outcome {
        AggregateOutcome::Approved => RequestStatus::Approved,
        AggregateOutcome::Denied => RequestStatus::Denied,
        AggregateOutcome::StillOpen => match current {
            RequestStatus::Pending => RequestStatus::InReview,
            other => other,
        },
    }
}

/// Precondition gate for recording one decision. The caller must be the
/// seat's assigned approver and hold the seat's required capability
/// (admins bypass both). Checked before the conditional write; the write
/// itself re-checks `pending` so a lost race still surfaces as
/// `AlreadyDecided` rather than a silent overwrite.
pub fn check_decision(
    request: &ApprovalRequest,
    decision: Option<&ApprovalDecision>,
    caller: &Actor,
    value: DecisionValue,
    comment: Option<&str>,
) -> Result<(), ApprovalError> {
    if !value.is_terminal() {
        return Err(ApprovalError::Validation(
            "decision must be `approved` or `denied`".to_string(),
        ));
    }

    if request.status.is_terminal() {
        return Err(ApprovalError::AlreadyDecided);
    }

    let decision = decision.ok_or(ApprovalError::NotFound)?;
    if decision.value.is_terminal() {
        return Err(ApprovalError::AlreadyDecided);
    }

    if !caller.role.is_admin() {
        if caller.id != decision.approver_id {
            return Err(ApprovalError::Unauthorized);
        }
        if !caller.role.capabilities().contains(&decision.role.required_capability()) {
            return Err(ApprovalError::Unauthorized);
        }
    }

    // Denials must be justified; approvals need not be.
    if value == DecisionValue::Denied
        && comment.map(|c| c.trim().is_empty()).unwrap_or(true)
    {
        return Err(ApprovalError::Validation(
            "a denial requires a non-empty comment".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{check_decision, evaluate, next_status, AggregateOutcome, ApprovalError};
    use crate::domain::actor::{Actor, ActorId, ActorRole};
    use crate::domain::decision::{ApprovalDecision, DecisionValue};
    use crate::domain::employee::EmployeeId;
    use crate::domain::request::{ApprovalRequest, FlowKind, RequestId, RequestStatus};
    use crate::domain::role::ApproverRole;
    use crate::domain::tenant::TenantId;

    fn request(status: RequestStatus, roles: &[ApproverRole]) -> ApprovalRequest {
        let now = Utc::now();
        ApprovalRequest {
            id: RequestId("REQ-1".to_string()),
            tenant_id: TenantId("acme".to_string()),
            subject_id: EmployeeId("emp-7".to_string()),
            flow: FlowKind::Offboarding,
            status,
            required_roles: roles.to_vec(),
            created_at: now,
            updated_at: now,
        }
    }

    fn seat(role: ApproverRole, approver: &str, value: DecisionValue) -> ApprovalDecision {
        ApprovalDecision {
            request_id: RequestId("REQ-1".to_string()),
            role,
            approver_id: ActorId(approver.to_string()),
            value,
            comment: None,
            decided_at: value.is_terminal().then(Utc::now),
        }
    }

    #[test]
    fn all_approved_aggregates_to_approved() {
        let decisions = [
            seat(ApproverRole::Manager, "u-mgr", DecisionValue::Approved),
            seat(ApproverRole::Hr, "u-hr", DecisionValue::Approved),
        ];
        assert_eq!(evaluate(&decisions), AggregateOutcome::Approved);
    }

    #[test]
    fn single_denial_short_circuits_over_pending_seats() {
        let decisions = [
            seat(ApproverRole::Manager, "u-mgr", DecisionValue::Approved),
            seat(ApproverRole::Hr, "u-hr", DecisionValue::Denied),
            seat(ApproverRole::Ceo, "u-ceo", DecisionValue::Pending),
        ];
        assert_eq!(evaluate(&decisions), AggregateOutcome::Denied);
    }

    #[test]
    fn open_seats_without_denial_keep_the_request_open() {
        let decisions = [
            seat(ApproverRole::Manager, "u-mgr", DecisionValue::Approved),
            seat(ApproverRole::Hr, "u-hr", DecisionValue::Pending),
        ];
        assert_eq!(evaluate(&decisions), AggregateOutcome::StillOpen);
    }

    #[test]
    fn aggregation_is_commutative_over_submission_order() {
        let mut decisions = vec![
            seat(ApproverRole::Manager, "u-mgr", DecisionValue::Approved),
            seat(ApproverRole::Hr, "u-hr", DecisionValue::Approved),
            seat(ApproverRole::Ceo, "u-ceo", DecisionValue::Approved),
        ];
        let baseline = evaluate(&decisions);
        decisions.reverse();
        assert_eq!(evaluate(&decisions), baseline);
        decisions.swap(0, 1);
        assert_eq!(evaluate(&decisions), baseline);
    }

    #[test]
    fn still_open_moves_pending_to_in_review_only() {
        assert_eq!(
            next_status(RequestStatus::Pending, AggregateOutcome::StillOpen),
            RequestStatus::InReview
        );
        assert_eq!(
            next_status(RequestStatus::InReview, AggregateOutcome::StillOpen),
            RequestStatus::InReview
        );
        assert_eq!(
            next_status(RequestStatus::InReview, AggregateOutcome::Denied),
            RequestStatus::Denied
        );
        assert_eq!(
            next_status(RequestStatus::Pending, AggregateOutcome::Approved),
            RequestStatus::Approved
        );
    }

    #[test]
    fn assigned_approver_passes_the_gate() {
        let request = request(RequestStatus::InReview, &[ApproverRole::Manager]);
        let row = seat(ApproverRole::Manager, "u-mgr", DecisionValue::Pending);
        let caller = Actor::new("u-mgr", ActorRole::Manager);

        assert_eq!(
            check_decision(&request, Some(&row), &caller, DecisionValue::Approved, None),
            Ok(())
        );
    }

    #[test]
    fn unrelated_caller_is_unauthorized_and_row_is_untouched() {
        let request = request(RequestStatus::InReview, &[ApproverRole::Manager]);
        let row = seat(ApproverRole::Manager, "u-mgr", DecisionValue::Pending);
        let caller = Actor::new("u-other", ActorRole::Manager);

        assert_eq!(
            check_decision(&request, Some(&row), &caller, DecisionValue::Approved, None),
            Err(ApprovalError::Unauthorized)
        );
        assert_eq!(row.value, DecisionValue::Pending);
    }

    #[test]
    fn assigned_id_without_the_seats_capability_is_unauthorized() {
        let request = request(RequestStatus::InReview, &[ApproverRole::Hr]);
        let row = seat(ApproverRole::Hr, "u-hr", DecisionValue::Pending);
        // Same account id as the seat assignment, but an employee-level
        // role carries no people-ops capability.
        let caller = Actor::new("u-hr", ActorRole::Employee);

        assert_eq!(
            check_decision(&request, Some(&row), &caller, DecisionValue::Approved, None),
            Err(ApprovalError::Unauthorized)
        );
    }

    #[test]
    fn admin_break_glass_may_decide_for_any_seat() {
        let request = request(RequestStatus::InReview, &[ApproverRole::Ceo]);
        let row = seat(ApproverRole::Ceo, "u-ceo", DecisionValue::Pending);
        let caller = Actor::new("u-admin", ActorRole::Admin);

        assert_eq!(
            check_decision(&request, Some(&row), &caller, DecisionValue::Approved, None),
            Ok(())
        );
    }

    #[test]
    fn repeat_submission_fails_even_with_the_same_value() {
        let request = request(RequestStatus::InReview, &[ApproverRole::Hr]);
        let row = seat(ApproverRole::Hr, "u-hr", DecisionValue::Approved);
        let caller = Actor::new("u-hr", ActorRole::Hr);

        assert_eq!(
            check_decision(&request, Some(&row), &caller, DecisionValue::Approved, None),
            Err(ApprovalError::AlreadyDecided)
        );
    }

    #[test]
    fn decisions_after_the_request_went_terminal_are_rejected() {
        for status in [RequestStatus::Denied, RequestStatus::Approved, RequestStatus::Cancelled] {
            let request = request(status, &[ApproverRole::Ceo]);
            let row = seat(ApproverRole::Ceo, "u-ceo", DecisionValue::Pending);
            let caller = Actor::new("u-ceo", ActorRole::Ceo);

            assert_eq!(
                check_decision(&request, Some(&row), &caller, DecisionValue::Approved, None),
                Err(ApprovalError::AlreadyDecided)
            );
        }
    }

    #[test]
    fn missing_seat_is_not_found() {
        let request = request(RequestStatus::InReview, &[ApproverRole::Manager]);
        let caller = Actor::new("u-ceo", ActorRole::Ceo);

        assert_eq!(
            check_decision(&request, None, &caller, DecisionValue::Approved, None),
            Err(ApprovalError::NotFound)
        );
    }

    #[test]
    fn denial_without_comment_is_a_validation_error() {
        let request = request(RequestStatus::InReview, &[ApproverRole::Hr]);
        let row = seat(ApproverRole::Hr, "u-hr", DecisionValue::Pending);
        let caller = Actor::new("u-hr", ActorRole::Hr);

        for comment in [None, Some(""), Some("   ")] {
            assert!(matches!(
                check_decision(&request, Some(&row), &caller, DecisionValue::Denied, comment),
                Err(ApprovalError::Validation(_))
            ));
        }

        assert_eq!(
            check_decision(
                &request,
                Some(&row),
                &caller,
                DecisionValue::Denied,
                Some("budget exceeded")
            ),
            Ok(())
        );
    }

    #[test]
    fn recording_a_pending_value_is_rejected_outright() {
        let request = request(RequestStatus::InReview, &[ApproverRole::Hr]);
        let row = seat(ApproverRole::Hr, "u-hr", DecisionValue::Pending);
        let caller = Actor::new("u-hr", ActorRole::Hr);

        assert!(matches!(
            check_decision(&request, Some(&row), &caller, DecisionValue::Pending, None),
            Err(ApprovalError::Validation(_))
        ));
    }
}
