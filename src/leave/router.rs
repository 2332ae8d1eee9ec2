use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::leave::domain::{
    ApplicationId, BalanceKey, CategoryDraft, CategoryId, EmployeeContext, EmployeeId,
    LeaveSubmission, TenantId,
};
use crate::leave::service::{BalanceSeed, LeaveService, LeaveServiceError};
use crate::leave::workflow::{ApprovalAction, ProcessOutcome};
use crate::store::{LeaveStore, PolicyStore, StoreError};

/// Router builder exposing the HTTP surface for leave applications,
/// approvals, categories, balances, and comments. Identity is supplied
/// by the gateway through `x-tenant-id` / `x-employee-*` headers.
pub fn leave_router<S>(service: Arc<LeaveService<S>>) -> Router
where
    S: LeaveStore + PolicyStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/leave/applications",
            post(submit_handler::<S>).get(list_handler::<S>),
        )
        .route(
            "/api/v1/leave/applications/:application_id",
            get(get_handler::<S>),
        )
        .route(
            "/api/v1/leave/applications/:application_id/cancel",
            post(cancel_handler::<S>),
        )
        .route(
            "/api/v1/leave/applications/:application_id/decision",
            post(decision_handler::<S>),
        )
        .route(
            "/api/v1/leave/applications/:application_id/approvals",
            get(approvals_handler::<S>),
        )
        .route(
            "/api/v1/leave/applications/:application_id/comments",
            post(add_comment_handler::<S>).get(comments_handler::<S>),
        )
        .route(
            "/api/v1/leave/categories",
            post(create_category_handler::<S>).get(categories_handler::<S>),
        )
        .route(
            "/api/v1/leave/categories/:category_id",
            put(update_category_handler::<S>),
        )
        .route(
            "/api/v1/leave/balances",
            put(seed_balance_handler::<S>).get(balance_handler::<S>),
        )
        .with_state(service)
}

/// Identity headers resolved into a tenant plus employee snapshot.
pub(crate) struct RequestContext {
    pub tenant_id: TenantId,
    pub employee: EmployeeContext,
}

pub(crate) fn request_context(headers: &HeaderMap) -> Result<RequestContext, Response> {
    let tenant_id = required_uuid(headers, "x-tenant-id")?;
    let employee_id = required_uuid(headers, "x-employee-id")?;

    let employee = EmployeeContext {
        employee_id: EmployeeId(employee_id),
        name: header_string(headers, "x-employee-name").unwrap_or_default(),
        email: header_string(headers, "x-employee-email").unwrap_or_default(),
        role: header_string(headers, "x-employee-role"),
        department: header_string(headers, "x-employee-department"),
        position: header_string(headers, "x-employee-position"),
    };
    Ok(RequestContext {
        tenant_id: TenantId(tenant_id),
        employee,
    })
}

fn required_uuid(headers: &HeaderMap, name: &str) -> Result<Uuid, Response> {
    let Some(value) = header_string(headers, name) else {
        let payload = json!({ "error": format!("missing {name} header") });
        return Err((StatusCode::BAD_REQUEST, axum::Json(payload)).into_response());
    };
    Uuid::parse_str(&value).map_err(|_| {
        let payload = json!({ "error": format!("invalid {name} header") });
        (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
    })
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .filter(|value| !value.is_empty())
}

fn error_response(error: LeaveServiceError) -> Response {
    match error {
        LeaveServiceError::Shape(shape) => {
            let payload = json!({ "error": shape.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        LeaveServiceError::Invalid(outcome) => {
            let payload = json!({
                "errors": outcome.errors,
                "warnings": outcome.warnings,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        LeaveServiceError::ApplicationNotFound | LeaveServiceError::CategoryNotFound => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        LeaveServiceError::NotApplicationOwner => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        LeaveServiceError::NotCancellable => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        LeaveServiceError::Store(StoreError::Conflict(what)) => {
            let payload = json!({ "error": format!("{what} already exists") });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({ "error": other.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<LeaveSubmission>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.submit(context.tenant_id, &context.employee, submission) {
        Ok(submitted) => (StatusCode::CREATED, axum::Json(submitted)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.applications_for_employee(context.tenant_id, context.employee.employee_id) {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    Path(application_id): Path<Uuid>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.application(context.tenant_id, ApplicationId(application_id)) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    Path(application_id): Path<Uuid>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.cancel(
        context.tenant_id,
        ApplicationId(application_id),
        context.employee.employee_id,
    ) {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
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
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    Path(application_id): Path<Uuid>,
    axum::Json(body): axum::Json<DecisionBody>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
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
        ApplicationId(application_id),
        &context.employee,
        action,
        body.comments.as_deref(),
    ) {
        Ok(ProcessOutcome::Decided { status }) => {
            let payload = json!({ "status": status.label() });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(ProcessOutcome::NoPendingStep) => {
            let payload = json!({ "error": "no pending approval step for this approver" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approvals_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    Path(application_id): Path<Uuid>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.approval_steps(context.tenant_id, ApplicationId(application_id)) {
        Ok(steps) => (StatusCode::OK, axum::Json(steps)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommentBody {
    comment: String,
    #[serde(default)]
    parent_comment_id: Option<Uuid>,
}

pub(crate) async fn add_comment_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    Path(application_id): Path<Uuid>,
    axum::Json(body): axum::Json<CommentBody>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.add_comment(
        context.tenant_id,
        ApplicationId(application_id),
        &context.employee,
        body.comment,
        body.parent_comment_id,
    ) {
        Ok(comment) => (StatusCode::CREATED, axum::Json(comment)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn comments_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    Path(application_id): Path<Uuid>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.comments(context.tenant_id, ApplicationId(application_id)) {
        Ok(comments) => (StatusCode::OK, axum::Json(comments)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_category_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    axum::Json(draft): axum::Json<CategoryDraft>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.create_category(context.tenant_id, draft) {
        Ok(category) => (StatusCode::CREATED, axum::Json(category)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn categories_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.categories(context.tenant_id) {
        Ok(categories) => (StatusCode::OK, axum::Json(categories)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_category_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    Path(category_id): Path<Uuid>,
    axum::Json(draft): axum::Json<CategoryDraft>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.update_category(context.tenant_id, CategoryId(category_id), draft) {
        Ok(category) => (StatusCode::OK, axum::Json(category)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn seed_balance_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    axum::Json(seed): axum::Json<BalanceSeed>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    match service.seed_balance(context.tenant_id, seed) {
        Ok(balance) => (StatusCode::OK, axum::Json(balance)).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalanceQuery {
    leave_category_id: Uuid,
    year: i32,
    #[serde(default)]
    month: Option<u32>,
    #[serde(default)]
    employee_id: Option<Uuid>,
}

pub(crate) async fn balance_handler<S>(
    State(service): State<Arc<LeaveService<S>>>,
    headers: HeaderMap,
    Query(query): Query<BalanceQuery>,
) -> Response
where
    S: LeaveStore + PolicyStore + 'static,
{
    let context = match request_context(&headers) {
        Ok(context) => context,
        Err(response) => return response,
    };
    let key = BalanceKey {
        tenant_id: context.tenant_id,
        employee_id: query
            .employee_id
            .map(EmployeeId)
            .unwrap_or(context.employee.employee_id),
        leave_category_id: CategoryId(query.leave_category_id),
        year: query.year,
        month: query.month,
    };
    match service.balance(&key) {
        Ok(Some(balance)) => (StatusCode::OK, axum::Json(balance)).into_response(),
        Ok(None) => {
            let payload = json!({ "error": "leave balance not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
