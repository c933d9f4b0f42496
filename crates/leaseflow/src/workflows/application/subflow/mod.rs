//! Occupation-specific nested step sequences. Each sub-flow keeps its own
//! 1-based cursor and validation gates; retreating from its first step hands
//! control back to the parent sequencer, which the sub-flow never touches.

mod entrepreneur;
mod professional;
mod student;

use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationDraft, OccupationType, ValidationError, VerificationResult, VerificationStatus,
};

/// Steps that can appear inside an occupation sub-flow. Which subset exists,
/// and in what order, is the occupation's call; the student plan additionally
/// depends on who pays the rent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubflowStep {
    StudyDetails,
    PaymentResponsibility,
    IncomeSource,
    GuardianDetails,
    CompanyDetails,
    BusinessDetails,
    IncomeDocuments,
    IdentityCheck,
}

impl SubflowStep {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StudyDetails => "Study details",
            Self::PaymentResponsibility => "Payment responsibility",
            Self::IncomeSource => "Income source",
            Self::GuardianDetails => "Guardian details",
            Self::CompanyDetails => "Company details",
            Self::BusinessDetails => "Business details",
            Self::IncomeDocuments => "Income documents",
            Self::IdentityCheck => "Identity check",
        }
    }
}

/// Outcome of a sub-flow advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubflowAdvance {
    Stepped(SubflowStep),
    /// The final gate passed; the sub-flow is done and the wizard may close
    /// out the application.
    Completed,
}

/// Outcome of a sub-flow retreat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubflowRetreat {
    Stepped(SubflowStep),
    /// Retreated off the first sub-step; the parent sequencer takes over.
    ToParent,
}

/// One occupation's nested sequencer. Built fresh whenever the wizard enters
/// the occupation-details step, so the cursor always starts at 1.
#[derive(Debug, Clone)]
pub struct Subflow {
    occupation: OccupationType,
    cursor: usize,
}

impl Subflow {
    pub fn for_occupation(occupation: OccupationType) -> Self {
        Self {
            occupation,
            cursor: 1,
        }
    }

    pub fn occupation(&self) -> OccupationType {
        self.occupation
    }

    fn plan(&self, draft: &ApplicationDraft) -> Vec<SubflowStep> {
        match self.occupation {
            OccupationType::Student => student::plan(draft),
            OccupationType::Professional => professional::plan(),
            OccupationType::Entrepreneur => entrepreneur::plan(),
        }
    }

    pub fn total_steps(&self, draft: &ApplicationDraft) -> usize {
        self.plan(draft).len()
    }

    pub fn current_ordinal(&self, draft: &ApplicationDraft) -> usize {
        self.cursor.min(self.plan(draft).len())
    }

    pub fn current_step(&self, draft: &ApplicationDraft) -> SubflowStep {
        let plan = self.plan(draft);
        plan[self.cursor.min(plan.len()) - 1]
    }

    /// Gate the current sub-step, then step forward. Passing the final gate
    /// completes the sub-flow instead of moving the cursor.
    pub fn advance(&mut self, draft: &ApplicationDraft) -> Result<SubflowAdvance, ValidationError> {
        let plan = self.plan(draft);
        let ordinal = self.cursor.min(plan.len());
        gate(plan[ordinal - 1], draft)?;
        if ordinal == plan.len() {
            return Ok(SubflowAdvance::Completed);
        }
        self.cursor = ordinal + 1;
        Ok(SubflowAdvance::Stepped(plan[self.cursor - 1]))
    }

    pub fn retreat(&mut self, draft: &ApplicationDraft) -> SubflowRetreat {
        let plan = self.plan(draft);
        let ordinal = self.cursor.min(plan.len());
        if ordinal == 1 {
            return SubflowRetreat::ToParent;
        }
        self.cursor = ordinal - 1;
        SubflowRetreat::Stepped(plan[self.cursor - 1])
    }
}

fn gate(step: SubflowStep, draft: &ApplicationDraft) -> Result<(), ValidationError> {
    match step {
        SubflowStep::StudyDetails
        | SubflowStep::PaymentResponsibility
        | SubflowStep::IncomeSource
        | SubflowStep::GuardianDetails => student::gate(step, draft),
        SubflowStep::CompanyDetails => professional::gate(draft),
        SubflowStep::BusinessDetails => entrepreneur::gate(draft),
        SubflowStep::IncomeDocuments => income_gate(draft),
        SubflowStep::IdentityCheck => identity_gate(draft),
    }
}

/// Whose income documents are required follows who pays the rent.
fn income_gate(draft: &ApplicationDraft) -> Result<(), ValidationError> {
    if draft.guardian_pays() {
        if draft.guardian_income_documents.is_empty() && draft.guardian_income_document_urls.is_empty() {
            return Err(ValidationError::MissingField("guardian_income_documents"));
        }
    } else if draft.income_documents.is_empty() && draft.income_document_urls.is_empty() {
        return Err(ValidationError::MissingField("income_documents"));
    }
    Ok(())
}

/// The identity step needs the id document and video selfie on hand (plus
/// the guardian's id on the guardian path) and a completed applicant
/// verification before the sub-flow may finish. When the sequence includes
/// the guardian pass, that pass must have completed too.
fn identity_gate(draft: &ApplicationDraft) -> Result<(), ValidationError> {
    if draft.id_document.is_none() && draft.id_document_url.is_none() {
        return Err(ValidationError::MissingField("id_document"));
    }
    if draft.video_selfie.is_none() && draft.video_selfie_url.is_none() {
        return Err(ValidationError::MissingField("video_selfie"));
    }
    if draft.guardian_pays()
        && draft.guardian_id_document.is_none()
        && draft.guardian_id_document_url.is_none()
    {
        return Err(ValidationError::MissingField("guardian_id_document"));
    }
    if draft.requires_guardian_verification() && !completed(&draft.guardian_verification) {
        return Err(ValidationError::VerificationPending);
    }
    if completed(&draft.applicant_verification) {
        Ok(())
    } else {
        Err(ValidationError::VerificationPending)
    }
}

/// Non-empty after trimming.
fn filled(value: &Option<String>) -> bool {
    value
        .as_deref()
        .is_some_and(|text| !text.trim().is_empty())
}

/// A recorded pass that actually finished.
fn completed(result: &Option<VerificationResult>) -> bool {
    result
        .as_ref()
        .is_some_and(|result| result.status == VerificationStatus::Completed)
}
