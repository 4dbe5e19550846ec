//! JSON API for the approval workflow engine.
//!
//! Endpoints:
//! - `POST /api/v1/approvals`                        — open an approval request
//! - `GET  /api/v1/approvals?tenant_id=&role=`       — list open requests
//! - `GET  /api/v1/approvals/{id}`                   — fetch one request with its seats
//! - `POST /api/v1/approvals/{id}/decisions/{role}`  — record one seat's verdict
//! - `POST /api/v1/approvals/{id}/cancel`            — withdraw an open request
//! - `GET  /api/v1/approvals/{id}/audit`             — audit trail for a request
//!
//! Identity arrives as `x-actor-id` / `x-actor-role` headers, resolved by
//! the gateway in front of this service. The `admin` role additionally
//! requires `x-admin-token` to match the configured break-glass token.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use hrflow_core::approvals::ApprovalError;
use hrflow_core::audit::AuditEvent;
use hrflow_core::domain::actor::{Actor, ActorId, ActorRole};
use hrflow_core::domain::decision::{ApprovalDecision, DecisionValue};
use hrflow_core::domain::employee::EmployeeId;
use hrflow_core::domain::request::{ApprovalRequest, FlowKind, RequestId, RequestStatus};
use hrflow_core::domain::role::ApproverRole;
use hrflow_core::domain::tenant::TenantId;
use hrflow_core::errors::{ApplicationError, InterfaceError};
use hrflow_db::repositories::SqlAuditSink;

use crate::service::{ApprovalService, CreateRequestInput};

#[derive(Clone)]
pub struct ApiState {
    service: Arc<ApprovalService>,
    audit_trail: SqlAuditSink,
    admin_token: Option<SecretString>,
}

impl ApiState {
    pub fn new(
        service: Arc<ApprovalService>,
        audit_trail: SqlAuditSink,
        admin_token: Option<SecretString>,
    ) -> Self {
        Self { service, audit_trail, admin_token }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/v1/approvals", post(create_request).get(list_open))
        .route("/api/v1/approvals/{id}", get(get_request))
        .route("/api/v1/approvals/{id}/decisions/{role}", post(record_decision))
        .route("/api/v1/approvals/{id}/cancel", post(cancel_request))
        .route("/api/v1/approvals/{id}/audit", get(audit_trail))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    pub tenant_id: String,
    pub subject_id: String,
    pub flow: String,
    #[serde(default)]
    pub approvers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
pub struct DecisionBody {
    pub decision: String,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub tenant_id: String,
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestEnvelope {
    pub request: ApprovalRequest,
    pub decisions: Vec<ApprovalDecision>,
}

#[derive(Debug, Serialize)]
pub struct DecisionOutcomeBody {
    pub previous_status: RequestStatus,
    pub new_status: RequestStatus,
    pub transitioned: bool,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub correlation_id: String,
}

type ApiFailure = (StatusCode, Json<ApiError>);

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn fail(error: ApplicationError) -> ApiFailure {
    let correlation_id = Uuid::new_v4().simple().to_string();
    let interface = error.into_interface(correlation_id.clone());
    let status = match &interface {
        InterfaceError::NotFound { .. } => StatusCode::NOT_FOUND,
        InterfaceError::Conflict { .. } => StatusCode::CONFLICT,
        InterfaceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        InterfaceError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(
        event_name = "api.request_failed",
        correlation_id = %correlation_id,
        error = %interface,
        "request rejected"
    );
    (status, Json(ApiError { error: interface.user_message().to_string(), correlation_id }))
}

fn invalid(message: impl Into<String>) -> ApiFailure {
    fail(ApprovalError::Validation(message.into()).into())
}

fn unauthenticated(message: impl Into<String>) -> ApiFailure {
    let correlation_id = Uuid::new_v4().simple().to_string();
    (StatusCode::UNAUTHORIZED, Json(ApiError { error: message.into(), correlation_id }))
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

fn identity(headers: &HeaderMap, admin_token: Option<&SecretString>) -> Result<Actor, ApiFailure> {
    let id = headers
        .get("x-actor-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| unauthenticated("missing x-actor-id header"))?;
    let role_raw = headers
        .get("x-actor-role")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| unauthenticated("missing x-actor-role header"))?;
    let role: ActorRole = role_raw
        .parse()
        .map_err(|_| unauthenticated(format!("unknown actor role `{role_raw}`")))?;

    if role.is_admin() {
        let provided = headers.get("x-admin-token").and_then(|v| v.to_str().ok());
        let valid = matches!(
            (admin_token, provided),
            (Some(expected), Some(given)) if expected.expose_secret() == given
        );
        if !valid {
            return Err(unauthenticated("admin access requires a valid x-admin-token"));
        }
    }

    Ok(Actor::new(id, role))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn create_request(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<CreateRequestBody>,
) -> Result<(StatusCode, Json<RequestEnvelope>), ApiFailure> {
    let caller = identity(&headers, state.admin_token.as_ref())?;

    let flow: FlowKind =
        body.flow.parse().map_err(|_| invalid(format!("unknown flow `{}`", body.flow)))?;
    let mut approvers = BTreeMap::new();
    for (role, actor) in &body.approvers {
        let role: ApproverRole =
            role.parse().map_err(|_| invalid(format!("unknown approver role `{role}`")))?;
        approvers.insert(role, ActorId(actor.clone()));
    }

    let input = CreateRequestInput {
        tenant_id: TenantId(body.tenant_id),
        subject_id: EmployeeId(body.subject_id),
        flow,
        approvers,
    };
    let request = state.service.create_request(input, &caller).await.map_err(fail)?;
    let (request, decisions) = state.service.get_request(&request.id).await.map_err(fail)?;

    Ok((StatusCode::CREATED, Json(RequestEnvelope { request, decisions })))
}

async fn get_request(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<RequestEnvelope>, ApiFailure> {
    let (request, decisions) =
        state.service.get_request(&RequestId(id)).await.map_err(fail)?;
    Ok(Json(RequestEnvelope { request, decisions }))
}

async fn list_open(
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<ApprovalRequest>>, ApiFailure> {
    let role = match &query.role {
        Some(raw) => Some(
            raw.parse::<ApproverRole>()
                .map_err(|_| invalid(format!("unknown approver role `{raw}`")))?,
        ),
        None => None,
    };
    let requests =
        state.service.list_open(&TenantId(query.tenant_id), role).await.map_err(fail)?;
    Ok(Json(requests))
}

async fn record_decision(
    State(state): State<ApiState>,
    Path((id, role)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<DecisionBody>,
) -> Result<Json<DecisionOutcomeBody>, ApiFailure> {
    let caller = identity(&headers, state.admin_token.as_ref())?;
    let role: ApproverRole =
        role.parse().map_err(|_| invalid(format!("unknown approver role `{role}`")))?;
    let value: DecisionValue = body
        .decision
        .parse()
        .map_err(|_| invalid(format!("unknown decision `{}`", body.decision)))?;

    let outcome = state
        .service
        .record_decision(&RequestId(id), role, &caller, value, body.comment.as_deref())
        .await
        .map_err(fail)?;

    Ok(Json(DecisionOutcomeBody {
        previous_status: outcome.previous_status,
        new_status: outcome.new_status,
        transitioned: outcome.transitioned,
    }))
}

async fn cancel_request(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ApprovalRequest>, ApiFailure> {
    let caller = identity(&headers, state.admin_token.as_ref())?;
    let request =
        state.service.cancel_request(&RequestId(id), &caller).await.map_err(fail)?;
    Ok(Json(request))
}

async fn audit_trail(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AuditEvent>>, ApiFailure> {
    let events = state
        .audit_trail
        .list_for_entity("approval_request", &id)
        .await
        .map_err(|error| fail(ApplicationError::Persistence(error.to_string())))?;
    Ok(Json(events))
}
