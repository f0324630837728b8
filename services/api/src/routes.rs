use crate::infra::{AppState, PortalServices};
use admission_portal::workflows::accounts::account_router;
use admission_portal::workflows::admissions::{admissions_router, AdmissionsState};
use admission_portal::workflows::cms::{content_router, ContentState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;

/// Account, admission and content routers merged with the ops endpoints.
pub(crate) fn with_portal_routes(services: &PortalServices) -> axum::Router {
    let admissions = AdmissionsState {
        accounts: services.accounts.clone(),
        admissions: services.admissions.clone(),
        review: services.review.clone(),
    };
    let content = ContentState {
        accounts: services.accounts.clone(),
        content: services.content.clone(),
    };

    account_router(services.accounts.clone())
        .merge(admissions_router(admissions))
        .merge(content_router(content))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
