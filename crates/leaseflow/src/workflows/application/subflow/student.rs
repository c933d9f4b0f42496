use super::{filled, SubflowStep};
use crate::workflows::application::domain::{ApplicationDraft, ValidationError};

/// Five steps, with a data-dependent third ordinal: once the payment
/// responsibility is chosen, ordinal 3 is either the income-source question
/// (student pays) or the guardian contact form (guardian pays). Until the
/// choice lands the plan shows the student-pays shape; it is recomputed on
/// every query, so the switch is immediate.
pub(super) fn plan(draft: &ApplicationDraft) -> Vec<SubflowStep> {
    vec![
        SubflowStep::StudyDetails,
        SubflowStep::PaymentResponsibility,
        if draft.guardian_pays() {
            SubflowStep::GuardianDetails
        } else {
            SubflowStep::IncomeSource
        },
        SubflowStep::IncomeDocuments,
        SubflowStep::IdentityCheck,
    ]
}

pub(super) fn gate(step: SubflowStep, draft: &ApplicationDraft) -> Result<(), ValidationError> {
    match step {
        SubflowStep::StudyDetails => {
            if !filled(&draft.student.university) {
                return Err(ValidationError::MissingField("university"));
            }
        }
        SubflowStep::PaymentResponsibility => {
            if draft.student.payment_responsible.is_none() {
                return Err(ValidationError::MissingField("payment_responsible"));
            }
        }
        SubflowStep::IncomeSource => {
            if !filled(&draft.student.income_source) {
                return Err(ValidationError::MissingField("income_source"));
            }
        }
        SubflowStep::GuardianDetails => {
            let guardian = draft
                .student
                .guardian
                .as_ref()
                .ok_or(ValidationError::MissingField("guardian"))?;
            if guardian.full_name.trim().is_empty() {
                return Err(ValidationError::MissingField("guardian.full_name"));
            }
            let email = guardian.email.trim();
            if email.is_empty() {
                return Err(ValidationError::MissingField("guardian.email"));
            }
            if !email.contains('@') {
                return Err(ValidationError::MalformedEmail);
            }
        }
        _ => {}
    }
    Ok(())
}
