use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::VerificationConfig;
use crate::workflows::application::domain::{
    DocumentKind, DocumentUrl, DraftPatch, GuardianContact, OccupationType, PendingDocument,
    PropertyId, VerificationResult, VerificationStatus, WizardId,
};
use crate::workflows::application::gateway::{
    ApplicationBackend, DocumentGateway, SubmittedApplication,
};
use crate::workflows::application::service::ApplicationDesk;
use crate::workflows::application::submission::ApplicationPayload;
use crate::workflows::application::verification::WidgetEvent;
use crate::workflows::platform::GatewayError;

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 9, 1).expect("valid date")
}

pub(super) fn occupancy() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date")
}

pub(super) fn verification_config() -> VerificationConfig {
    VerificationConfig {
        client_id: "verify-client-test".to_string(),
        flow_id: "kyc-test".to_string(),
    }
}

pub(super) fn document(file_name: &str, media_type: &str) -> PendingDocument {
    PendingDocument {
        file_name: file_name.to_string(),
        media_type: media_type.to_string(),
        content: file_name.as_bytes().to_vec(),
    }
}

pub(super) fn guardian_contact() -> GuardianContact {
    GuardianContact {
        full_name: "Rosa Fuentes".to_string(),
        email: "rosa.fuentes@example.com".to_string(),
        phone: Some("+52 55 8765 4321".to_string()),
    }
}

/// Property, lease terms, occupation, and a valid phone in one patch; enough
/// to carry the wizard to the occupation-details step.
pub(super) fn core_patch(occupation: OccupationType) -> DraftPatch {
    DraftPatch {
        property_id: Some(PropertyId("prop-302".to_string())),
        contract_duration_months: Some(6),
        occupancy_date: Some(occupancy()),
        occupation_type: Some(occupation),
        phone: Some("+52 55 1234 5678".to_string()),
        ..DraftPatch::default()
    }
}

pub(super) fn professional_patch() -> DraftPatch {
    DraftPatch {
        company: Some("Grupo Andino".to_string()),
        position: Some("Data analyst".to_string()),
        ..DraftPatch::default()
    }
}

pub(super) fn income_documents_patch() -> DraftPatch {
    DraftPatch {
        income_documents: Some(vec![
            document("payslip-june.pdf", "application/pdf"),
            document("payslip-july.pdf", "application/pdf"),
        ]),
        ..DraftPatch::default()
    }
}

pub(super) fn identity_documents_patch() -> DraftPatch {
    DraftPatch {
        id_document: Some(document("passport.jpg", "image/jpeg")),
        video_selfie: Some(document("selfie.mp4", "video/mp4")),
        ..DraftPatch::default()
    }
}

pub(super) fn completed_result(id: &str) -> VerificationResult {
    VerificationResult {
        verification_id: id.to_string(),
        status: VerificationStatus::Completed,
        identity_id: Some(format!("identity-{id}")),
        metadata: None,
    }
}

pub(super) fn failed_result(id: &str) -> VerificationResult {
    VerificationResult {
        verification_id: id.to_string(),
        status: VerificationStatus::Failed,
        identity_id: None,
        metadata: None,
    }
}

pub(super) fn cancelled_result(id: &str) -> VerificationResult {
    VerificationResult {
        verification_id: id.to_string(),
        status: VerificationStatus::Cancelled,
        identity_id: None,
        metadata: None,
    }
}

/// In-memory document store. Every upload mints a fresh URL carrying a
/// global sequence number, so a re-run is distinguishable from a cached
/// result.
#[derive(Default)]
pub(super) struct MemoryDocuments {
    uploads: Mutex<Vec<(DocumentKind, String)>>,
    sequence: AtomicUsize,
    fail_file: Mutex<Option<String>>,
}

impl MemoryDocuments {
    /// Make the upload of the named file fail at the gateway.
    pub(super) fn fail_for_file(&self, file_name: &str) {
        *self.fail_file.lock().expect("fail mutex poisoned") = Some(file_name.to_string());
    }

    pub(super) fn clear_failure(&self) {
        *self.fail_file.lock().expect("fail mutex poisoned") = None;
    }

    pub(super) fn uploads(&self) -> Vec<(DocumentKind, String)> {
        self.uploads.lock().expect("upload mutex poisoned").clone()
    }

    pub(super) fn upload_count(&self) -> usize {
        self.uploads.lock().expect("upload mutex poisoned").len()
    }
}

#[async_trait]
impl DocumentGateway for MemoryDocuments {
    async fn upload(
        &self,
        document: &PendingDocument,
        kind: DocumentKind,
    ) -> Result<DocumentUrl, GatewayError> {
        let failing = self.fail_file.lock().expect("fail mutex poisoned").clone();
        if failing.as_deref() == Some(document.file_name.as_str()) {
            return Err(GatewayError::Rejected {
                status: 500,
                message: "document storage unavailable".to_string(),
            });
        }
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        self.uploads
            .lock()
            .expect("upload mutex poisoned")
            .push((kind, document.file_name.clone()));
        Ok(DocumentUrl(format!(
            "https://cdn.leaseflow.test/{}/{sequence}-{}",
            kind.wire_name(),
            document.file_name
        )))
    }
}

/// In-memory marketplace backend recording every submitted payload.
#[derive(Default)]
pub(super) struct MemoryBackend {
    submissions: Mutex<Vec<ApplicationPayload>>,
    fail_message: Mutex<Option<String>>,
}

impl MemoryBackend {
    /// Make the next submissions fail with the given platform message.
    pub(super) fn fail_with(&self, message: &str) {
        *self.fail_message.lock().expect("fail mutex poisoned") = Some(message.to_string());
    }

    pub(super) fn clear_failure(&self) {
        *self.fail_message.lock().expect("fail mutex poisoned") = None;
    }

    pub(super) fn submissions(&self) -> Vec<ApplicationPayload> {
        self.submissions
            .lock()
            .expect("submission mutex poisoned")
            .clone()
    }
}

#[async_trait]
impl ApplicationBackend for MemoryBackend {
    async fn submit_application(
        &self,
        payload: ApplicationPayload,
    ) -> Result<SubmittedApplication, GatewayError> {
        let failing = self.fail_message.lock().expect("fail mutex poisoned").clone();
        if let Some(message) = failing {
            return Err(GatewayError::Rejected {
                status: 502,
                message,
            });
        }
        let mut submissions = self.submissions.lock().expect("submission mutex poisoned");
        submissions.push(payload);
        Ok(SubmittedApplication {
            id: format!("app-{:06}", submissions.len()),
            status: "received".to_string(),
        })
    }
}

pub(super) fn build_desk() -> (
    Arc<ApplicationDesk<MemoryDocuments, MemoryBackend>>,
    Arc<MemoryDocuments>,
    Arc<MemoryBackend>,
) {
    let documents = Arc::new(MemoryDocuments::default());
    let backend = Arc::new(MemoryBackend::default());
    let desk = Arc::new(ApplicationDesk::new(
        documents.clone(),
        backend.clone(),
        verification_config(),
    ));
    (desk, documents, backend)
}

/// Walk a fresh wizard through the whole professional path, ending with the
/// sub-flow completed and the session ready to submit.
pub(super) fn drive_professional_to_complete(
    desk: &ApplicationDesk<MemoryDocuments, MemoryBackend>,
    id: &WizardId,
) {
    desk.apply_patch(id, core_patch(OccupationType::Professional))
        .expect("core patch applies");
    for _ in 0..3 {
        desk.advance(id, today()).expect("top-level step advances");
    }
    desk.apply_patch(id, professional_patch())
        .expect("company patch applies");
    desk.advance(id, today()).expect("company step advances");
    desk.apply_patch(id, income_documents_patch())
        .expect("income patch applies");
    desk.advance(id, today()).expect("income step advances");
    desk.apply_patch(id, identity_documents_patch())
        .expect("identity patch applies");
    desk.verification_mount(id).expect("widget mounts");
    desk.verification_event(
        id,
        WidgetEvent::Finished {
            result: completed_result("verif-pro-1"),
        },
    )
    .expect("verification event accepted");
    desk.advance(id, today()).expect("identity step completes");
    let snapshot = desk.snapshot(id).expect("wizard still open");
    assert!(snapshot.complete, "professional walk should finish");
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
