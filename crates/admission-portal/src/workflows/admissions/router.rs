use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use super::documents::{DocumentUpload, StorageCollaborator};
use super::domain::{ApplicationId, DocumentSlot};
use super::lifecycle::ReviewDecision;
use super::repository::ApplicationRepository;
use super::review::{ApplicationQuery, BulkAction, ReviewService};
use super::service::{AdmissionService, AdmissionServiceError, ApplicationUpdate};
use super::steps::{PersonalInfoForm, ProgramInfoForm};
use super::views::ApplicationDetail;
use crate::workflows::accounts::{
    account_error_response, bearer_token, AccountService, AccountServiceError, AuthCollaborator,
    UserAccount, UserRepository,
};
use crate::workflows::outcome::ActionOutcome;
use crate::workflows::persistence::RepositoryError;

/// Services shared by the applicant and staff admission routes.
pub struct AdmissionsState<U, A, R, S> {
    pub accounts: Arc<AccountService<U, A>>,
    pub admissions: Arc<AdmissionService<R, S>>,
    pub review: Arc<ReviewService<R, U>>,
}

impl<U, A, R, S> Clone for AdmissionsState<U, A, R, S> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            admissions: Arc::clone(&self.admissions),
            review: Arc::clone(&self.review),
        }
    }
}

impl<U, A, R, S> AdmissionsState<U, A, R, S>
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    fn authenticated(&self, headers: &HeaderMap) -> Result<UserAccount, Response> {
        bearer_token(headers)
            .ok_or(AccountServiceError::Unauthenticated)
            .and_then(|token| self.accounts.current_user(&token))
            .map_err(account_error_response)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadParams {
    filename: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReviewRequest {
    decision: ReviewDecision,
    #[serde(default)]
    notes: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkRequest {
    action: BulkAction,
    application_ids: Vec<ApplicationId>,
}

/// Router builder exposing the applicant wizard and the staff review endpoints.
pub fn admissions_router<U, A, R, S>(state: AdmissionsState<U, A, R, S>) -> Router
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    let body_limit = usize::try_from(state.admissions.policy().largest_upload())
        .unwrap_or(usize::MAX)
        .saturating_mul(2);

    Router::new()
        .route(
            "/api/v1/admissions/dashboard",
            get(dashboard_handler::<U, A, R, S>),
        )
        .route(
            "/api/v1/admissions/application",
            get(application_handler::<U, A, R, S>),
        )
        .route(
            "/api/v1/admissions/personal-info",
            put(personal_info_handler::<U, A, R, S>),
        )
        .route(
            "/api/v1/admissions/program-info",
            put(program_info_handler::<U, A, R, S>),
        )
        .route(
            "/api/v1/admissions/documents/:slot",
            put(upload_handler::<U, A, R, S>).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/v1/admissions/submit",
            post(submit_handler::<U, A, R, S>),
        )
        .route(
            "/api/v1/admin/applications",
            get(list_handler::<U, A, R, S>),
        )
        .route(
            "/api/v1/admin/applications/export",
            get(export_handler::<U, A, R, S>),
        )
        .route(
            "/api/v1/admin/applications/bulk",
            post(bulk_handler::<U, A, R, S>),
        )
        .route(
            "/api/v1/admin/applications/:application_id",
            get(admin_detail_handler::<U, A, R, S>),
        )
        .route(
            "/api/v1/admin/applications/:application_id/review",
            post(review_handler::<U, A, R, S>),
        )
        .with_state(state)
}

/// Shared mapping from admission failures to HTTP responses.
pub fn admission_error_response(error: AdmissionServiceError) -> Response {
    match error {
        AdmissionServiceError::Validation(error) => {
            field_error(error.field(), error.to_string())
        }
        AdmissionServiceError::Document(error) => {
            field_error(error.slot().key(), error.to_string())
        }
        AdmissionServiceError::Step(error) => {
            ActionOutcome::failure(error.to_string()).respond(StatusCode::CONFLICT)
        }
        AdmissionServiceError::Transition(error) => {
            ActionOutcome::failure(error.to_string()).respond(StatusCode::CONFLICT)
        }
        AdmissionServiceError::Repository(RepositoryError::NotFound) => {
            ActionOutcome::failure("application not found").respond(StatusCode::NOT_FOUND)
        }
        AdmissionServiceError::Forbidden => {
            ActionOutcome::failure("You do not have permission to perform this action.")
                .respond(StatusCode::FORBIDDEN)
        }
        other => {
            error!(error = %other, "admissions request failed");
            ActionOutcome::failure(other.to_string()).respond(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn field_error(field: &str, message: String) -> Response {
    let payload = json!({
        "success": false,
        "field": field,
        "message": message,
    });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}

fn update_response(update: ApplicationUpdate) -> Response {
    let status = if update.outcome.success {
        StatusCode::OK
    } else {
        StatusCode::CONFLICT
    };
    let payload = json!({
        "success": update.outcome.success,
        "message": update.outcome.message,
        "application": ApplicationDetail::from(update.application),
    });
    (status, axum::Json(payload)).into_response()
}

fn respond<T: serde::Serialize>(result: Result<T, AdmissionServiceError>) -> Response {
    match result {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => admission_error_response(error),
    }
}

pub(crate) async fn dashboard_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    match state.authenticated(&headers) {
        Ok(user) => respond(state.admissions.dashboard(&user)),
        Err(response) => response,
    }
}

pub(crate) async fn application_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    match state.authenticated(&headers) {
        Ok(user) => respond(state.admissions.detail(&user)),
        Err(response) => response,
    }
}

pub(crate) async fn personal_info_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    headers: HeaderMap,
    axum::Json(form): axum::Json<PersonalInfoForm>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    let user = match state.authenticated(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.admissions.record_personal_info(&user, form) {
        Ok(update) => update_response(update),
        Err(error) => admission_error_response(error),
    }
}

pub(crate) async fn program_info_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    headers: HeaderMap,
    axum::Json(form): axum::Json<ProgramInfoForm>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    let user = match state.authenticated(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.admissions.record_program_info(&user, form) {
        Ok(update) => update_response(update),
        Err(error) => admission_error_response(error),
    }
}

pub(crate) async fn upload_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    Path(slot): Path<DocumentSlot>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    let user = match state.authenticated(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    let upload = DocumentUpload {
        slot,
        file_name: params.filename,
        bytes: body.to_vec(),
    };
    match state.admissions.upload_documents(&user, vec![upload]) {
        Ok(update) => update_response(update),
        Err(error) => admission_error_response(error),
    }
}

pub(crate) async fn submit_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    let user = match state.authenticated(&headers) {
        Ok(user) => user,
        Err(response) => return response,
    };
    match state.admissions.submit(&user) {
        Ok(update) => update_response(update),
        Err(error) => admission_error_response(error),
    }
}

pub(crate) async fn list_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    Query(query): Query<ApplicationQuery>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    match state.authenticated(&headers) {
        Ok(reviewer) => respond(state.review.list(&reviewer, &query)),
        Err(response) => response,
    }
}

pub(crate) async fn export_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    Query(query): Query<ApplicationQuery>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    let reviewer = match state.authenticated(&headers) {
        Ok(reviewer) => reviewer,
        Err(response) => return response,
    };
    match state.review.export_csv(&reviewer, &query) {
        Ok(csv) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"applications.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(error) => admission_error_response(error),
    }
}

pub(crate) async fn admin_detail_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    Path(application_id): Path<Uuid>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    match state.authenticated(&headers) {
        Ok(reviewer) => respond(
            state
                .review
                .detail(&reviewer, &ApplicationId(application_id)),
        ),
        Err(response) => response,
    }
}

pub(crate) async fn review_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    Path(application_id): Path<Uuid>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<ReviewRequest>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    let reviewer = match state.authenticated(&headers) {
        Ok(reviewer) => reviewer,
        Err(response) => return response,
    };
    let id = ApplicationId(application_id);
    match state
        .review
        .review(&reviewer, &id, request.decision, &request.notes)
    {
        Ok(update) => update_response(update),
        Err(error) => admission_error_response(error),
    }
}

pub(crate) async fn bulk_handler<U, A, R, S>(
    State(state): State<AdmissionsState<U, A, R, S>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<BulkRequest>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    let reviewer = match state.authenticated(&headers) {
        Ok(reviewer) => reviewer,
        Err(response) => return response,
    };
    match state
        .review
        .bulk(&reviewer, request.action, &request.application_ids)
    {
        Ok(outcome) => outcome.respond(StatusCode::OK),
        Err(error) => admission_error_response(error),
    }
}
