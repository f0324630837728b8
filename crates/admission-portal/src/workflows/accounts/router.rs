use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{LoginRequest, ProfileUpdate, Registration, SessionToken, UserQuery};
use super::repository::{AuthCollaborator, AuthFailure, UserRepository};
use super::service::{
    AccountService, AccountServiceError, LOGGED_IN_MESSAGE, REGISTERED_MESSAGE,
};
use crate::workflows::outcome::ActionOutcome;
use crate::workflows::persistence::RepositoryError;

/// Router builder exposing registration, login, profile and staff user listing endpoints.
pub fn account_router<U, A>(service: Arc<AccountService<U, A>>) -> Router
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
{
    Router::new()
        .route("/api/v1/accounts/register", post(register_handler::<U, A>))
        .route("/api/v1/accounts/login", post(login_handler::<U, A>))
        .route("/api/v1/accounts/logout", post(logout_handler::<U, A>))
        .route(
            "/api/v1/accounts/me",
            get(profile_handler::<U, A>).patch(update_profile_handler::<U, A>),
        )
        .route("/api/v1/admin/users", get(list_users_handler::<U, A>))
        .with_state(service)
}

/// Extract the session token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(SessionToken(token.to_string()))
    }
}

/// Shared mapping from account failures to HTTP responses.
pub fn account_error_response(error: AccountServiceError) -> Response {
    match error {
        AccountServiceError::Validation(error) => {
            let payload = json!({
                "success": false,
                "field": error.field(),
                "message": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        AccountServiceError::Unauthenticated
        | AccountServiceError::Auth(AuthFailure::UnknownSession) => {
            ActionOutcome::failure("Please log in to continue.").respond(StatusCode::UNAUTHORIZED)
        }
        AccountServiceError::Auth(AuthFailure::InvalidCredentials) => {
            ActionOutcome::failure(AuthFailure::InvalidCredentials.to_string())
                .respond(StatusCode::UNAUTHORIZED)
        }
        AccountServiceError::Forbidden => {
            ActionOutcome::failure("Staff access is required.").respond(StatusCode::FORBIDDEN)
        }
        AccountServiceError::Repository(RepositoryError::NotFound) => {
            ActionOutcome::failure("account not found").respond(StatusCode::NOT_FOUND)
        }
        other => ActionOutcome::failure(other.to_string())
            .respond(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

pub(crate) async fn register_handler<U, A>(
    State(service): State<Arc<AccountService<U, A>>>,
    axum::Json(registration): axum::Json<Registration>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
{
    let signed_in = service
        .register(registration)
        .and_then(|user| service.sign_in(&user).map(|token| (user, token)));

    match signed_in {
        Ok((user, token)) => {
            let payload = json!({
                "success": true,
                "message": REGISTERED_MESSAGE,
                "token": token.0,
                "user": user.profile_view(),
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => account_error_response(error),
    }
}

pub(crate) async fn login_handler<U, A>(
    State(service): State<Arc<AccountService<U, A>>>,
    axum::Json(request): axum::Json<LoginRequest>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
{
    match service.login(request) {
        Ok((user, token)) => {
            let payload = json!({
                "success": true,
                "message": LOGGED_IN_MESSAGE,
                "token": token.0,
                "user": user.profile_view(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => account_error_response(error),
    }
}

pub(crate) async fn logout_handler<U, A>(
    State(service): State<Arc<AccountService<U, A>>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return account_error_response(AccountServiceError::Unauthenticated);
    };
    match service.logout(&token) {
        Ok(outcome) => outcome.respond(StatusCode::OK),
        Err(error) => account_error_response(error),
    }
}

pub(crate) async fn profile_handler<U, A>(
    State(service): State<Arc<AccountService<U, A>>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
{
    let current = bearer_token(&headers)
        .ok_or(AccountServiceError::Unauthenticated)
        .and_then(|token| service.current_user(&token));
    match current {
        Ok(user) => (StatusCode::OK, axum::Json(user.profile_view())).into_response(),
        Err(error) => account_error_response(error),
    }
}

pub(crate) async fn update_profile_handler<U, A>(
    State(service): State<Arc<AccountService<U, A>>>,
    headers: HeaderMap,
    axum::Json(update): axum::Json<ProfileUpdate>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
{
    let updated = bearer_token(&headers)
        .ok_or(AccountServiceError::Unauthenticated)
        .and_then(|token| service.current_user(&token))
        .and_then(|user| service.update_profile(&user.id, update));
    match updated {
        Ok((user, outcome)) => {
            let payload = json!({
                "success": outcome.success,
                "message": outcome.message,
                "user": user.profile_view(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => account_error_response(error),
    }
}

pub(crate) async fn list_users_handler<U, A>(
    State(service): State<Arc<AccountService<U, A>>>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
{
    let listed = bearer_token(&headers)
        .ok_or(AccountServiceError::Unauthenticated)
        .and_then(|token| service.current_user(&token))
        .and_then(|reviewer| service.list(&reviewer, &query));
    match listed {
        Ok(rows) => (StatusCode::OK, axum::Json(rows)).into_response(),
        Err(error) => account_error_response(error),
    }
}
