use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use leaseflow::workflows::application::{
    wizard_router, ApplicationBackend, ApplicationDesk, DocumentGateway,
};
use leaseflow::workflows::contract::{contract_router, ContractGateway, ContractService};
use serde_json::json;
use std::sync::Arc;

/// Both workflow routers plus the operational endpoints, as one app router.
pub(crate) fn with_workflow_routes<D, B, G>(
    desk: Arc<ApplicationDesk<D, B>>,
    contracts: Arc<ContractService<G>>,
) -> axum::Router
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
    G: ContractGateway + 'static,
{
    wizard_router(desk)
        .merge(contract_router(contracts))
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
