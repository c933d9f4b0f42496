use super::{filled, SubflowStep};
use crate::workflows::application::domain::{ApplicationDraft, ValidationError};

/// Fixed three-step sequence ending in identity verification.
pub(super) fn plan() -> Vec<SubflowStep> {
    vec![
        SubflowStep::BusinessDetails,
        SubflowStep::IncomeDocuments,
        SubflowStep::IdentityCheck,
    ]
}

pub(super) fn gate(draft: &ApplicationDraft) -> Result<(), ValidationError> {
    if !filled(&draft.entrepreneur.business_name) {
        return Err(ValidationError::MissingField("business_name"));
    }
    if !filled(&draft.entrepreneur.sector) {
        return Err(ValidationError::MissingField("sector"));
    }
    Ok(())
}
