use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier of the advertised property the applicant is applying for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

/// Identifier of an open application wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WizardId(pub String);

/// Occupation declared by the applicant; selects the detail sub-flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupationType {
    Student,
    Professional,
    Entrepreneur,
}

impl OccupationType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "Student",
            Self::Professional => "Professional",
            Self::Entrepreneur => "Entrepreneur",
        }
    }
}

/// Who pays the rent on the student path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentResponsible {
    Student,
    Guardian,
}

impl PaymentResponsible {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "Student pays",
            Self::Guardian => "Guardian pays",
        }
    }
}

/// Contact details for the guardian who covers the rent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianContact {
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Answers collected by the student sub-flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentDetails {
    pub university: Option<String>,
    pub income_source: Option<String>,
    pub payment_responsible: Option<PaymentResponsible>,
    pub guardian: Option<GuardianContact>,
}

/// Answers collected by the professional sub-flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfessionalDetails {
    pub company: Option<String>,
    pub position: Option<String>,
}

/// Answers collected by the entrepreneur sub-flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrepreneurDetails {
    pub business_name: Option<String>,
    pub sector: Option<String>,
}

/// A document handed over by the client but not yet pushed to storage.
///
/// Content travels base64-encoded on the JSON surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDocument {
    pub file_name: String,
    pub media_type: String,
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Storage category a document is uploaded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocumentKind {
    Id,
    Video,
    GuardianId,
    Income,
}

impl DocumentKind {
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Video => "video",
            Self::GuardianId => "guardian-id",
            Self::Income => "income",
        }
    }
}

/// URL of a document that finished uploading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUrl(pub String);

/// Terminal outcome reported by the identity verification widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Completed,
    Failed,
    Cancelled,
}

impl VerificationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Completed => "Completed",
            Self::Failed => "Failed",
            Self::Cancelled => "Cancelled",
        }
    }
}

/// Result of one identity verification pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verification_id: String,
    pub status: VerificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// In-progress rental application. Lives only inside an open wizard session;
/// nothing here is persisted and closing the wizard discards it.
///
/// Invariant: a `*_url` counterpart is set iff the matching upload completed.
/// The upload join is all-or-nothing, so the counterparts never resolve
/// partially within one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub property_id: Option<PropertyId>,
    pub contract_duration_months: Option<u32>,
    pub occupancy_date: Option<NaiveDate>,
    pub occupation_type: Option<OccupationType>,
    pub phone: Option<String>,
    #[serde(default)]
    pub student: StudentDetails,
    #[serde(default)]
    pub professional: ProfessionalDetails,
    #[serde(default)]
    pub entrepreneur: EntrepreneurDetails,
    pub id_document: Option<PendingDocument>,
    pub video_selfie: Option<PendingDocument>,
    pub guardian_id_document: Option<PendingDocument>,
    #[serde(default)]
    pub income_documents: Vec<PendingDocument>,
    #[serde(default)]
    pub guardian_income_documents: Vec<PendingDocument>,
    pub id_document_url: Option<DocumentUrl>,
    pub video_selfie_url: Option<DocumentUrl>,
    pub guardian_id_document_url: Option<DocumentUrl>,
    #[serde(default)]
    pub income_document_urls: Vec<DocumentUrl>,
    #[serde(default)]
    pub guardian_income_document_urls: Vec<DocumentUrl>,
    pub guardian_verification: Option<VerificationResult>,
    pub applicant_verification: Option<VerificationResult>,
}

impl ApplicationDraft {
    /// Merge a patch into the draft. Present fields overwrite, absent fields
    /// leave the draft untouched, document lists are replaced wholesale.
    ///
    /// Every mutation of a draft goes through here so the session always
    /// holds the single authoritative copy.
    pub fn apply(&mut self, patch: DraftPatch) {
        if let Some(property_id) = patch.property_id {
            self.property_id = Some(property_id);
        }
        if let Some(duration) = patch.contract_duration_months {
            self.contract_duration_months = Some(duration);
        }
        if let Some(date) = patch.occupancy_date {
            self.occupancy_date = Some(date);
        }
        if let Some(occupation) = patch.occupation_type {
            self.occupation_type = Some(occupation);
        }
        if let Some(phone) = patch.phone {
            self.phone = Some(phone);
        }
        if let Some(university) = patch.university {
            self.student.university = Some(university);
        }
        if let Some(income_source) = patch.income_source {
            self.student.income_source = Some(income_source);
        }
        if let Some(responsible) = patch.payment_responsible {
            self.student.payment_responsible = Some(responsible);
        }
        if let Some(guardian) = patch.guardian {
            self.student.guardian = Some(guardian);
        }
        if let Some(company) = patch.company {
            self.professional.company = Some(company);
        }
        if let Some(position) = patch.position {
            self.professional.position = Some(position);
        }
        if let Some(business_name) = patch.business_name {
            self.entrepreneur.business_name = Some(business_name);
        }
        if let Some(sector) = patch.sector {
            self.entrepreneur.sector = Some(sector);
        }
        if let Some(document) = patch.id_document {
            self.id_document = Some(document);
        }
        if let Some(document) = patch.video_selfie {
            self.video_selfie = Some(document);
        }
        if let Some(document) = patch.guardian_id_document {
            self.guardian_id_document = Some(document);
        }
        if let Some(documents) = patch.income_documents {
            self.income_documents = documents;
        }
        if let Some(documents) = patch.guardian_income_documents {
            self.guardian_income_documents = documents;
        }
        if let Some(url) = patch.id_document_url {
            self.id_document_url = Some(url);
        }
        if let Some(url) = patch.video_selfie_url {
            self.video_selfie_url = Some(url);
        }
        if let Some(url) = patch.guardian_id_document_url {
            self.guardian_id_document_url = Some(url);
        }
        if let Some(urls) = patch.income_document_urls {
            self.income_document_urls = urls;
        }
        if let Some(urls) = patch.guardian_income_document_urls {
            self.guardian_income_document_urls = urls;
        }
    }

    /// Whether a usable phone number is already on the draft. Whitespace-only
    /// values count as absent.
    pub fn phone_on_file(&self) -> bool {
        self.phone
            .as_deref()
            .is_some_and(|phone| !phone.trim().is_empty())
    }

    /// Whether the guardian covers the rent, which routes income and identity
    /// collection to the guardian.
    pub fn guardian_pays(&self) -> bool {
        self.student.payment_responsible == Some(PaymentResponsible::Guardian)
    }

    /// Whether the verification sequence includes the guardian pass: only
    /// student drafts where the guardian pays. A payer answer left over from
    /// an occupation switch never widens the sequence.
    pub fn requires_guardian_verification(&self) -> bool {
        self.occupation_type == Some(OccupationType::Student) && self.guardian_pays()
    }

    /// Record the outcome of the guardian verification pass.
    pub fn record_guardian_verification(&mut self, result: VerificationResult) {
        self.guardian_verification = Some(result);
    }

    /// Record the outcome of the applicant verification pass.
    pub fn record_applicant_verification(&mut self, result: VerificationResult) {
        self.applicant_verification = Some(result);
    }

    /// Drop any recorded verification passes.
    pub fn discard_verifications(&mut self) {
        self.guardian_verification = None;
        self.applicant_verification = None;
    }

    /// Discard all accumulated answers.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Client-facing merge patch for [`ApplicationDraft::apply`]. Verification
/// results are excluded on purpose; those are recorded by the wizard when the
/// widget reports back, never patched in directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftPatch {
    pub property_id: Option<PropertyId>,
    pub contract_duration_months: Option<u32>,
    pub occupancy_date: Option<NaiveDate>,
    pub occupation_type: Option<OccupationType>,
    pub phone: Option<String>,
    pub university: Option<String>,
    pub income_source: Option<String>,
    pub payment_responsible: Option<PaymentResponsible>,
    pub guardian: Option<GuardianContact>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub business_name: Option<String>,
    pub sector: Option<String>,
    pub id_document: Option<PendingDocument>,
    pub video_selfie: Option<PendingDocument>,
    pub guardian_id_document: Option<PendingDocument>,
    pub income_documents: Option<Vec<PendingDocument>>,
    pub guardian_income_documents: Option<Vec<PendingDocument>>,
    pub id_document_url: Option<DocumentUrl>,
    pub video_selfie_url: Option<DocumentUrl>,
    pub guardian_id_document_url: Option<DocumentUrl>,
    pub income_document_urls: Option<Vec<DocumentUrl>>,
    pub guardian_income_document_urls: Option<Vec<DocumentUrl>>,
}

const MIN_PHONE_DIGITS: usize = 8;

/// Shared phone validation used by the phone step gate and the submission
/// assembler. Accepts digits plus the usual separators and requires at least
/// eight digits; anything else counts as a placeholder.
pub fn phone_is_valid(phone: &str) -> bool {
    let trimmed = phone.trim();
    let digits = trimmed.chars().filter(char::is_ascii_digit).count();
    digits >= MIN_PHONE_DIGITS
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | '.' | ' '))
}

/// Local gate failures. These block step advancement and never reach the
/// network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("phone number must have at least eight digits and only digits, spaces, or + - ( ) .")]
    MalformedPhone,
    #[error("occupancy date must not be in the past")]
    OccupancyDateInPast,
    #[error("contract duration must be a positive number of months")]
    NonPositiveDuration,
    #[error("guardian email address is malformed")]
    MalformedEmail,
    #[error("identity verification has not completed yet")]
    VerificationPending,
}
