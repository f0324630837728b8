use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::domain::{NewPage, PageEdit};
use super::repository::PageRepository;
use super::service::{ContentService, ContentServiceError};
use crate::workflows::accounts::{
    account_error_response, bearer_token, AccountService, AccountServiceError, AuthCollaborator,
    UserAccount, UserRepository,
};
use crate::workflows::outcome::ActionOutcome;
use crate::workflows::persistence::RepositoryError;

pub struct ContentState<U, A, P> {
    pub accounts: Arc<AccountService<U, A>>,
    pub content: Arc<ContentService<P>>,
}

impl<U, A, P> Clone for ContentState<U, A, P> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
            content: Arc::clone(&self.content),
        }
    }
}

impl<U, A, P> ContentState<U, A, P>
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    P: PageRepository + 'static,
{
    fn authenticated(&self, headers: &HeaderMap) -> Result<UserAccount, Response> {
        bearer_token(headers)
            .ok_or(AccountServiceError::Unauthenticated)
            .and_then(|token| self.accounts.current_user(&token))
            .map_err(account_error_response)
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageSearch {
    #[serde(default)]
    search: Option<String>,
}

/// Router builder exposing public page reads and staff page authoring.
pub fn content_router<U, A, P>(state: ContentState<U, A, P>) -> Router
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    P: PageRepository + 'static,
{
    Router::new()
        .route("/api/v1/pages", get(list_pages_handler::<U, A, P>))
        .route("/api/v1/pages/menu", get(menu_handler::<U, A, P>))
        .route("/api/v1/pages/:slug", get(page_handler::<U, A, P>))
        .route("/api/v1/admin/pages", post(create_page_handler::<U, A, P>))
        .route(
            "/api/v1/admin/pages/:slug",
            patch(edit_page_handler::<U, A, P>),
        )
        .with_state(state)
}

pub fn content_error_response(error: ContentServiceError) -> Response {
    match error {
        ContentServiceError::DuplicateSlug => {
            let payload = json!({
                "success": false,
                "field": "slug",
                "message": ContentServiceError::DuplicateSlug.to_string(),
            });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        error @ (ContentServiceError::InvalidSlug { .. } | ContentServiceError::MissingTitle) => {
            let payload = json!({
                "success": false,
                "field": error.field(),
                "message": error.to_string(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ContentServiceError::Forbidden => {
            ActionOutcome::failure("You do not have permission to perform this action.")
                .respond(StatusCode::FORBIDDEN)
        }
        ContentServiceError::Repository(RepositoryError::NotFound) => {
            ActionOutcome::failure("page not found").respond(StatusCode::NOT_FOUND)
        }
        other => {
            error!(error = %other, "content request failed");
            ActionOutcome::failure(other.to_string()).respond(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub(crate) async fn list_pages_handler<U, A, P>(
    State(state): State<ContentState<U, A, P>>,
    Query(params): Query<PageSearch>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    P: PageRepository + 'static,
{
    match state.content.live_pages(params.search.as_deref()) {
        Ok(pages) => (StatusCode::OK, axum::Json(pages)).into_response(),
        Err(error) => content_error_response(error),
    }
}

pub(crate) async fn menu_handler<U, A, P>(State(state): State<ContentState<U, A, P>>) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    P: PageRepository + 'static,
{
    match state.content.menu() {
        Ok(entries) => (StatusCode::OK, axum::Json(entries)).into_response(),
        Err(error) => content_error_response(error),
    }
}

pub(crate) async fn page_handler<U, A, P>(
    State(state): State<ContentState<U, A, P>>,
    Path(slug): Path<String>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    P: PageRepository + 'static,
{
    match state.content.live_page(&slug) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => content_error_response(error),
    }
}

pub(crate) async fn create_page_handler<U, A, P>(
    State(state): State<ContentState<U, A, P>>,
    headers: HeaderMap,
    axum::Json(new_page): axum::Json<NewPage>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    P: PageRepository + 'static,
{
    let author = match state.authenticated(&headers) {
        Ok(author) => author,
        Err(response) => return response,
    };
    match state.content.create_page(&author, new_page) {
        Ok(page) => (StatusCode::CREATED, axum::Json(page)).into_response(),
        Err(error) => content_error_response(error),
    }
}

pub(crate) async fn edit_page_handler<U, A, P>(
    State(state): State<ContentState<U, A, P>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    axum::Json(edit): axum::Json<PageEdit>,
) -> Response
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
    P: PageRepository + 'static,
{
    let author = match state.authenticated(&headers) {
        Ok(author) => author,
        Err(response) => return response,
    };
    match state.content.edit_page(&author, &slug, edit) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => content_error_response(error),
    }
}
