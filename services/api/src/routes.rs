use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use onboard_ai::workflows::onboarding::{
    onboarding_router, AuditPublisher, ExtractionGateway, LowConfidenceAlerter, OnboardingService,
    StudentDirectory,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_onboarding_routes<G, D, A, P>(
    service: Arc<OnboardingService<G, D, A, P>>,
) -> axum::Router
where
    G: ExtractionGateway + 'static,
    D: StudentDirectory + 'static,
    A: LowConfidenceAlerter + 'static,
    P: AuditPublisher + 'static,
{
    onboarding_router(service)
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
