use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::leave::router::request_context;
use crate::leave::workflow::ApprovalAction;
use crate::policy::approval::PolicyReviewOutcome;
use crate::policy::domain::{PolicyDraft, PolicyId, PolicyUpdate};
use crate::policy::service::{PolicyService, PolicyServiceError};
use crate::store::{PolicyStore, StoreError};

/// Router builder for the policy lifecycle surface.
pub fn policy_router<S>(service: Arc<PolicyService<S>>) -> Router
where
    S: PolicyStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/policies",
            post(create_handler::<S>).get(list_handler::<S>),
        )
        .route(
            "/api/v1/policies/:policy_id",
            get(get_handler::<S>).put(update_handler::<S>),
        )
        .route(
            "/api/v1/policies/:policy_id/decision",
            post(decision_handler::<S>),
        )
        .route(
            "/api/v1/policies/:policy_id/reviews",
            get(reviews_handler::<S>),
        )
        .route(
            "/api/v1/policies/:policy_id/versions",
            get(versions_handler::<S>),
        )
        .with_state(service)
}

fn error_response(error: PolicyServiceError) -> Response {
    match error {
        PolicyServiceError::Rule(rule) => {
            let payload = json!({ "error": rule.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        PolicyServiceError::PolicyNotFound => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        PolicyServiceError::Store(StoreError::Conflict(what)) => {
            let payload = json!({ "error": format!("{what} already exists") });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn create_handler<S>(
    State(service): State<Arc<PolicyService<S>>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<PolicyDraft>,
) -> Response
where
    S: PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.create(context.tenant_id, &context.employee, draft) {
        Ok(policy) => (StatusCode::CREATED, axum::Json(policy)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<PolicyService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.list(context.tenant_id) {
        Ok(policies) => (StatusCode::OK, axum::Json(policies)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<PolicyService<S>>>,
    headers: HeaderMap,
    Path(policy_id): Path<Uuid>,
) -> Response
where
    S: PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.policy(context.tenant_id, PolicyId(policy_id)) {
        Ok(policy) => (StatusCode::OK, axum::Json(policy)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<PolicyService<S>>>,
    headers: HeaderMap,
    Path(policy_id): Path<Uuid>,
    axum::Json(update): axum::Json<PolicyUpdate>,
) -> Response
where
    S: PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.update(
        context.tenant_id,
        PolicyId(policy_id),
        &context.employee,
        update,
    ) {
        Ok(policy) => (StatusCode::OK, axum::Json(policy)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionBody {
    action: String,
    #[serde(default)]
    comments: Option<String>,
}

pub(crate) async fn decision_handler<S>(
    State(service): State<Arc<PolicyService<S>>>,
    headers: HeaderMap,
    Path(policy_id): Path<Uuid>,
    axum::Json(body): axum::Json<DecisionBody>,
) -> Response
where
    S: PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    let Some(action) = ApprovalAction::parse(&body.action) else {
        let payload = json!({ "error": "action must be approve or reject" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    };

    match service.decide(
        context.tenant_id,
        PolicyId(policy_id),
        &context.employee,
        action,
        body.comments.as_deref(),
    ) {
        Ok(PolicyReviewOutcome::Decided { status }) => {
            let payload = json!({ "status": status.label() });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(PolicyReviewOutcome::NoPendingApproval) => {
            let payload = json!({ "error": "no pending review for this approver" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reviews_handler<S>(
    State(service): State<Arc<PolicyService<S>>>,
    headers: HeaderMap,
    Path(policy_id): Path<Uuid>,
) -> Response
where
    S: PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.reviews_for(context.tenant_id, PolicyId(policy_id)) {
        Ok(reviews) => (StatusCode::OK, axum::Json(reviews)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn versions_handler<S>(
    State(service): State<Arc<PolicyService<S>>>,
    headers: HeaderMap,
    Path(policy_id): Path<Uuid>,
) -> Response
where
    S: PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    let policy = match service.policy(context.tenant_id, PolicyId(policy_id)) {
        Ok(policy) => policy,
        Err(error) => return error_response(error),
    };
    match service.versions(context.tenant_id, &policy.policy_name) {
        Ok(versions) => (StatusCode::OK, axum::Json(versions)).into_response(),
        Err(error) => error_response(error),
    }
}
