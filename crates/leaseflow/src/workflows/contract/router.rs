use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::workflows::platform::GatewayError;

use super::domain::{ContractError, ContractId};
use super::gateway::ContractGateway;
use super::progress::{progress, Viewer};
use super::service::{ContractService, ContractServiceError};
use super::signing::{SignatureFailure, SignatureRequest, SignatureRunError};

/// Router builder exposing the contract signing endpoints.
pub fn contract_router<G>(service: Arc<ContractService<G>>) -> Router
where
    G: ContractGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/contracts/:contract_id/progress",
            get(progress_handler::<G>),
        )
        .route(
            "/api/v1/contracts/:contract_id/entitlements",
            post(entitlements_handler::<G>),
        )
        .route(
            "/api/v1/contracts/:contract_id/signatures",
            post(sign_handler::<G>),
        )
        .with_state(service)
}

/// Body of a signature run: who is signing and the signatures to submit, in
/// submission order.
#[derive(Debug, Deserialize)]
pub(crate) struct SignatureRunRequest {
    pub viewer: Viewer,
    pub signatures: Vec<SignatureRequest>,
}

pub(crate) async fn progress_handler<G>(
    State(service): State<Arc<ContractService<G>>>,
    Path(contract_id): Path<String>,
) -> Response
where
    G: ContractGateway + 'static,
{
    match service.progress(&ContractId(contract_id)).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn entitlements_handler<G>(
    State(service): State<Arc<ContractService<G>>>,
    Path(contract_id): Path<String>,
    axum::Json(viewer): axum::Json<Viewer>,
) -> Response
where
    G: ContractGateway + 'static,
{
    match service.entitlements(&ContractId(contract_id), &viewer).await {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn sign_handler<G>(
    State(service): State<Arc<ContractService<G>>>,
    Path(contract_id): Path<String>,
    axum::Json(request): axum::Json<SignatureRunRequest>,
) -> Response
where
    G: ContractGateway + 'static,
{
    let SignatureRunRequest { viewer, signatures } = request;
    match service
        .run_signatures(&ContractId(contract_id), &viewer, signatures)
        .await
    {
        Ok(report) => {
            let payload = json!({
                "contract": report.contract,
                "committed": report.committed,
                "progress": report.progress,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: ContractServiceError) -> Response {
    match error {
        ContractServiceError::Fetch(GatewayError::Rejected { status: 404, .. }) => {
            let payload = json!({ "error": "contract not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        ContractServiceError::Fetch(source) => {
            let payload = json!({ "error": source.to_string() });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
        ContractServiceError::Contract(ref source) => {
            let status = contract_error_status(source);
            let payload = json!({ "error": error.to_string() });
            (status, axum::Json(payload)).into_response()
        }
        ContractServiceError::NotEntitled(_) => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        ContractServiceError::EmptyRun => {
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        ContractServiceError::Run(run) => run_error_response(run),
    }
}

/// A failed run still reports what was committed before the failure, plus
/// the progress over the latest snapshot, so the signing screen can
/// re-render without pretending the whole batch rolled back.
fn run_error_response(error: SignatureRunError) -> Response {
    let status = match &error.source {
        SignatureFailure::Contract(source) => contract_error_status(source),
        SignatureFailure::Gateway(_) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({
        "error": error.to_string(),
        "role": error.role.wire_name(),
        "committed": error.committed,
        "progress": progress(&error.latest),
    });
    (status, axum::Json(payload)).into_response()
}

fn contract_error_status(error: &ContractError) -> StatusCode {
    match error {
        ContractError::SlotAlreadySigned => StatusCode::CONFLICT,
        ContractError::MisalignedSignatureBook
        | ContractError::UnknownGuarantor
        | ContractError::MissingGuarantorId => StatusCode::UNPROCESSABLE_ENTITY,
    }
}
