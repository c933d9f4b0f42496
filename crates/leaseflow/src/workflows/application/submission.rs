use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::workflows::platform::GatewayError;

use super::domain::{
    phone_is_valid, ApplicationDraft, DocumentUrl, GuardianContact, OccupationType,
    PaymentResponsible, PropertyId, VerificationResult,
};
use super::upload::{UploadError, UploadedDocuments};

/// Payload the marketplace backend expects for application creation. Unset
/// optional fields serialize as absent, not null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationPayload {
    pub property_id: PropertyId,
    pub contract_duration_months: u32,
    pub occupancy_date: NaiveDate,
    pub occupation_type: OccupationType,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub university: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub income_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_responsible: Option<PaymentResponsible>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian: Option<GuardianContact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_document_url: Option<DocumentUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_selfie_url: Option<DocumentUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guardian_id_document_url: Option<DocumentUrl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub income_document_urls: Vec<DocumentUrl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guardian_income_document_urls: Vec<DocumentUrl>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_verification: Option<VerificationResult>,
}

/// Pure transform from a finished draft plus one batch of uploaded URLs to
/// the backend payload.
///
/// Where the draft already carries a resolved URL for a slot, that URL wins
/// over a freshly uploaded one; for the document arrays the draft's
/// non-empty list wins wholesale.
pub fn assemble(
    draft: &ApplicationDraft,
    uploaded: &UploadedDocuments,
) -> Result<ApplicationPayload, SubmissionError> {
    let property_id = draft
        .property_id
        .clone()
        .ok_or(SubmissionError::MissingRequiredData("property_id"))?;
    let contract_duration_months = match draft.contract_duration_months {
        Some(months) if months > 0 => months,
        _ => return Err(SubmissionError::MissingRequiredData("contract_duration_months")),
    };
    let occupancy_date = draft
        .occupancy_date
        .ok_or(SubmissionError::MissingRequiredData("occupancy_date"))?;
    let occupation_type = draft
        .occupation_type
        .ok_or(SubmissionError::MissingRequiredData("occupation_type"))?;
    let phone = match draft.phone.as_deref().map(str::trim) {
        Some(phone) if phone_is_valid(phone) => phone.to_string(),
        _ => return Err(SubmissionError::PlaceholderPhone),
    };

    Ok(ApplicationPayload {
        property_id,
        contract_duration_months,
        occupancy_date,
        occupation_type,
        phone,
        university: draft.student.university.clone(),
        income_source: draft.student.income_source.clone(),
        payment_responsible: draft.student.payment_responsible,
        guardian: draft.student.guardian.clone(),
        company: draft.professional.company.clone(),
        position: draft.professional.position.clone(),
        business_name: draft.entrepreneur.business_name.clone(),
        sector: draft.entrepreneur.sector.clone(),
        id_document_url: draft
            .id_document_url
            .clone()
            .or_else(|| uploaded.id_document_url.clone()),
        video_selfie_url: draft
            .video_selfie_url
            .clone()
            .or_else(|| uploaded.video_selfie_url.clone()),
        guardian_id_document_url: draft
            .guardian_id_document_url
            .clone()
            .or_else(|| uploaded.guardian_id_document_url.clone()),
        income_document_urls: if draft.income_document_urls.is_empty() {
            uploaded.income_document_urls.clone()
        } else {
            draft.income_document_urls.clone()
        },
        guardian_income_document_urls: if draft.guardian_income_document_urls.is_empty() {
            uploaded.guardian_income_document_urls.clone()
        } else {
            draft.guardian_income_document_urls.clone()
        },
        identity_verification: draft.applicant_verification.clone(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("missing required data: {0}")]
    MissingRequiredData(&'static str),
    #[error("phone number is missing or looks like a placeholder")]
    PlaceholderPhone,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("application submission failed: {0}")]
    Backend(#[source] GatewayError),
}

impl SubmissionError {
    /// Friendly message for the applicant. Backend messages pass through
    /// verbatim when present; a light substring check picks an upload or
    /// network flavored message first.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::MissingRequiredData(field) => format!(
                "Some required information is missing ({field}). Please review your answers."
            ),
            SubmissionError::PlaceholderPhone => {
                "Please provide a valid phone number before submitting.".to_string()
            }
            SubmissionError::Upload(UploadError::DocumentRejected { file_name, .. }) => format!(
                "We could not upload your documents ({file_name} failed). Please try again."
            ),
            SubmissionError::Backend(source) => {
                let message = match source {
                    GatewayError::Rejected { message, .. } => message.trim(),
                    GatewayError::Transport(message) => message.trim(),
                };
                let lowered = message.to_lowercase();
                if lowered.contains("upload") {
                    "We could not upload your documents. Please try again.".to_string()
                } else if lowered.contains("network")
                    || lowered.contains("timeout")
                    || lowered.contains("connect")
                {
                    "We could not reach the server. Check your connection and try again."
                        .to_string()
                } else if message.is_empty() {
                    "Something went wrong while submitting your application. Please try again."
                        .to_string()
                } else {
                    message.to_string()
                }
            }
        }
    }
}
