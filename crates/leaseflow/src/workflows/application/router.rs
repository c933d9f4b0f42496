use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::domain::{DraftPatch, WizardId};
use super::gateway::{ApplicationBackend, DocumentGateway};
use super::service::{ApplicationDesk, DeskError};
use super::submission::SubmissionError;
use super::verification::WidgetEvent;

/// Router builder exposing the wizard session endpoints.
pub fn wizard_router<D, B>(desk: Arc<ApplicationDesk<D, B>>) -> Router
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    Router::new()
        .route("/api/v1/applications/wizards", post(open_handler::<D, B>))
        .route(
            "/api/v1/applications/wizards/:wizard_id",
            get(snapshot_handler::<D, B>).delete(abandon_handler::<D, B>),
        )
        .route(
            "/api/v1/applications/wizards/:wizard_id/draft",
            patch(draft_handler::<D, B>),
        )
        .route(
            "/api/v1/applications/wizards/:wizard_id/advance",
            post(advance_handler::<D, B>),
        )
        .route(
            "/api/v1/applications/wizards/:wizard_id/retreat",
            post(retreat_handler::<D, B>),
        )
        .route(
            "/api/v1/applications/wizards/:wizard_id/verification/mount",
            post(mount_handler::<D, B>),
        )
        .route(
            "/api/v1/applications/wizards/:wizard_id/verification/events",
            post(event_handler::<D, B>),
        )
        .route(
            "/api/v1/applications/wizards/:wizard_id/submit",
            post(submit_handler::<D, B>),
        )
        .with_state(desk)
}

/// Optional body for the advance endpoint; tests pin the date, real clients
/// omit it.
#[derive(Debug, Deserialize)]
pub(crate) struct AdvanceRequest {
    pub today: Option<NaiveDate>,
}

pub(crate) async fn open_handler<D, B>(
    State(desk): State<Arc<ApplicationDesk<D, B>>>,
) -> Response
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    let (id, snapshot) = desk.open_wizard();
    let payload = json!({
        "wizard_id": id.0,
        "snapshot": snapshot,
    });
    (StatusCode::CREATED, axum::Json(payload)).into_response()
}

pub(crate) async fn snapshot_handler<D, B>(
    State(desk): State<Arc<ApplicationDesk<D, B>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    match desk.snapshot(&WizardId(wizard_id)) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn draft_handler<D, B>(
    State(desk): State<Arc<ApplicationDesk<D, B>>>,
    Path(wizard_id): Path<String>,
    axum::Json(patch): axum::Json<DraftPatch>,
) -> Response
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    match desk.apply_patch(&WizardId(wizard_id), patch) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn advance_handler<D, B>(
    State(desk): State<Arc<ApplicationDesk<D, B>>>,
    Path(wizard_id): Path<String>,
    body: Option<axum::Json<AdvanceRequest>>,
) -> Response
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    let today = body
        .and_then(|axum::Json(request)| request.today)
        .unwrap_or_else(|| Local::now().date_naive());
    match desk.advance(&WizardId(wizard_id), today) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn retreat_handler<D, B>(
    State(desk): State<Arc<ApplicationDesk<D, B>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    match desk.retreat(&WizardId(wizard_id)) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn mount_handler<D, B>(
    State(desk): State<Arc<ApplicationDesk<D, B>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    match desk.verification_mount(&WizardId(wizard_id)) {
        Ok(mount) => (StatusCode::OK, axum::Json(mount)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn event_handler<D, B>(
    State(desk): State<Arc<ApplicationDesk<D, B>>>,
    Path(wizard_id): Path<String>,
    axum::Json(event): axum::Json<WidgetEvent>,
) -> Response
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    match desk.verification_event(&WizardId(wizard_id), event) {
        Ok(Some(update)) => (StatusCode::OK, axum::Json(update)).into_response(),
        Ok(None) => {
            let payload = json!({ "update": "none" });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<D, B>(
    State(desk): State<Arc<ApplicationDesk<D, B>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    match desk.submit(&WizardId(wizard_id)).await {
        Ok(submitted) => (StatusCode::ACCEPTED, axum::Json(submitted)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn abandon_handler<D, B>(
    State(desk): State<Arc<ApplicationDesk<D, B>>>,
    Path(wizard_id): Path<String>,
) -> Response
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    match desk.abandon(&WizardId(wizard_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: DeskError) -> Response {
    let status = match &error {
        DeskError::UnknownWizard => StatusCode::NOT_FOUND,
        DeskError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DeskError::WizardIncomplete | DeskError::VerificationInactive => StatusCode::CONFLICT,
        DeskError::Submission(
            SubmissionError::MissingRequiredData(_) | SubmissionError::PlaceholderPhone,
        ) => StatusCode::UNPROCESSABLE_ENTITY,
        DeskError::Submission(_) => StatusCode::BAD_GATEWAY,
    };
    let message = match &error {
        DeskError::Submission(submission) => submission.user_message(),
        other => other.to_string(),
    };
    (status, axum::Json(json!({ "error": message }))).into_response()
}
