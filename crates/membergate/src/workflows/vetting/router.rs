use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::access::{AccessControlGate, AccessError};
use super::cache::StatusCache;
use super::domain::{ApplicationId, EventId, StatusToken, UserId, VettingApplication};
use super::public::{LookupError, StatusLookup};
use super::repository::{ApplicationStore, RoleDirectory, StatusNotifier};
use super::service::{VettingError, VettingWorkflowService};

/// Shared state behind the vetting HTTP surface.
pub struct VettingRouterState<S, D, N, C> {
    pub service: Arc<VettingWorkflowService<S, D, N, C>>,
    pub gate: Arc<AccessControlGate<S, C>>,
    pub lookup: Arc<StatusLookup<S>>,
}

impl<S, D, N, C> Clone for VettingRouterState<S, D, N, C> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            gate: self.gate.clone(),
            lookup: self.lookup.clone(),
        }
    }
}

/// Router builder exposing the administrative transition API, the access-check
/// API, and the public status API.
pub fn vetting_router<S, D, N, C>(state: VettingRouterState<S, D, N, C>) -> Router
where
    S: ApplicationStore + 'static,
    D: RoleDirectory + 'static,
    N: StatusNotifier + 'static,
    C: StatusCache + 'static,
{
    Router::new()
        .route(
            "/api/v1/vetting/applications/:application_id/status",
            post(transition_handler::<S, D, N, C>),
        )
        .route(
            "/api/v1/vetting/applications/:application_id/interview",
            post(interview_handler::<S, D, N, C>),
        )
        .route(
            "/api/v1/vetting/access/:user_id/events/:event_id/rsvp",
            get(rsvp_access_handler::<S, D, N, C>),
        )
        .route(
            "/api/v1/vetting/access/:user_id/events/:event_id/ticket",
            get(ticket_access_handler::<S, D, N, C>),
        )
        .route(
            "/api/v1/vetting/status/:token",
            get(status_by_token_handler::<S, D, N, C>),
        )
        .route(
            "/api/v1/vetting/users/:user_id/status",
            get(my_status_handler::<S, D, N, C>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub target_status: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub actor_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleInterviewRequest {
    pub scheduled_for: DateTime<Utc>,
    pub location: String,
    pub actor_id: String,
}

/// Administrative view of an application after a successful mutation.
#[derive(Debug, Serialize)]
pub struct ApplicationView {
    pub application_id: ApplicationId,
    pub application_number: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_made_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_scheduled_for: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_location: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ApplicationView {
    fn of(application: &VettingApplication) -> Self {
        Self {
            application_id: application.id.clone(),
            application_number: application.application_number.clone(),
            status: application.status.label(),
            decision_made_at: application.decision_made_at,
            interview_scheduled_for: application.interview_scheduled_for,
            interview_location: application.interview_location.clone(),
            updated_at: application.updated_at,
        }
    }
}

pub(crate) async fn transition_handler<S, D, N, C>(
    State(state): State<VettingRouterState<S, D, N, C>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<TransitionRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: RoleDirectory + 'static,
    N: StatusNotifier + 'static,
    C: StatusCache + 'static,
{
    let target = match request.target_status.parse() {
        Ok(status) => status,
        Err(err) => {
            let payload = json!({ "error": format!("{err}") });
            return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
        }
    };

    let result = state.service.request_transition(
        &ApplicationId(application_id),
        target,
        request.notes.as_deref(),
        &UserId(request.actor_id),
    );

    match result {
        Ok(application) => {
            (StatusCode::OK, axum::Json(ApplicationView::of(&application))).into_response()
        }
        Err(error) => vetting_error_response(error),
    }
}

pub(crate) async fn interview_handler<S, D, N, C>(
    State(state): State<VettingRouterState<S, D, N, C>>,
    Path(application_id): Path<String>,
    axum::Json(request): axum::Json<ScheduleInterviewRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: RoleDirectory + 'static,
    N: StatusNotifier + 'static,
    C: StatusCache + 'static,
{
    let result = state.service.schedule_interview(
        &ApplicationId(application_id),
        request.scheduled_for,
        &request.location,
        &UserId(request.actor_id),
    );

    match result {
        Ok(application) => {
            (StatusCode::OK, axum::Json(ApplicationView::of(&application))).into_response()
        }
        Err(error) => vetting_error_response(error),
    }
}

pub(crate) async fn rsvp_access_handler<S, D, N, C>(
    State(state): State<VettingRouterState<S, D, N, C>>,
    Path((user_id, event_id)): Path<(String, String)>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: RoleDirectory + 'static,
    N: StatusNotifier + 'static,
    C: StatusCache + 'static,
{
    access_response(
        state
            .gate
            .can_user_rsvp(&UserId(user_id), &EventId(event_id)),
    )
}

pub(crate) async fn ticket_access_handler<S, D, N, C>(
    State(state): State<VettingRouterState<S, D, N, C>>,
    Path((user_id, event_id)): Path<(String, String)>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: RoleDirectory + 'static,
    N: StatusNotifier + 'static,
    C: StatusCache + 'static,
{
    access_response(
        state
            .gate
            .can_user_purchase_ticket(&UserId(user_id), &EventId(event_id)),
    )
}

pub(crate) async fn status_by_token_handler<S, D, N, C>(
    State(state): State<VettingRouterState<S, D, N, C>>,
    Path(token): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: RoleDirectory + 'static,
    N: StatusNotifier + 'static,
    C: StatusCache + 'static,
{
    lookup_response(state.lookup.status_by_token(&StatusToken(token)))
}

pub(crate) async fn my_status_handler<S, D, N, C>(
    State(state): State<VettingRouterState<S, D, N, C>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    D: RoleDirectory + 'static,
    N: StatusNotifier + 'static,
    C: StatusCache + 'static,
{
    lookup_response(state.lookup.status_for_user(&UserId(user_id)))
}

fn access_response(result: Result<super::access::AccessDecision, AccessError>) -> Response {
    match result {
        Ok(decision) => (StatusCode::OK, axum::Json(decision)).into_response(),
        Err(AccessError::Store(error)) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

fn lookup_response(result: Result<super::public::StatusView, LookupError>) -> Response {
    match result {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(LookupError::NotFound) => {
            let payload = json!({ "error": "status unavailable" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
    }
}

fn vetting_error_response(error: VettingError) -> Response {
    let status = match &error {
        VettingError::NotFound => StatusCode::NOT_FOUND,
        VettingError::AccessDenied => StatusCode::FORBIDDEN,
        VettingError::InvalidTransition { .. }
        | VettingError::TerminalStateModification(_)
        | VettingError::NotesRequired(_)
        | VettingError::InvalidInterviewDate
        | VettingError::InterviewLocationRequired => StatusCode::UNPROCESSABLE_ENTITY,
        VettingError::Store(_) | VettingError::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}
