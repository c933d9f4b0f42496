use super::{filled, SubflowStep};
use crate::workflows::application::domain::{ApplicationDraft, ValidationError};

/// Fixed three-step sequence ending in identity verification.
pub(super) fn plan() -> Vec<SubflowStep> {
    vec![
        SubflowStep::CompanyDetails,
        SubflowStep::IncomeDocuments,
        SubflowStep::IdentityCheck,
    ]
}

pub(super) fn gate(draft: &ApplicationDraft) -> Result<(), ValidationError> {
    if !filled(&draft.professional.company) {
        return Err(ValidationError::MissingField("company"));
    }
    if !filled(&draft.professional.position) {
        return Err(ValidationError::MissingField("position"));
    }
    Ok(())
}
