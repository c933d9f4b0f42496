use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationDraft, ValidationError};

/// Top-level wizard steps. Which of these exist, and at which ordinal,
/// depends on the draft; see [`step_plan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    PropertySelection,
    LeaseTerms,
    OccupationChoice,
    PhoneNumber,
    OccupationDetails,
}

impl StepId {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PropertySelection => "Property selection",
            Self::LeaseTerms => "Lease terms",
            Self::OccupationChoice => "Occupation",
            Self::PhoneNumber => "Phone number",
            Self::OccupationDetails => "Occupation details",
        }
    }
}

/// Compute the ordered step plan for the draft, fresh on every call.
///
/// The phone step only exists while no phone is on file, so the same ordinal
/// can name different steps at different moments. Callers must never cache
/// the returned plan across draft mutations.
pub fn step_plan(draft: &ApplicationDraft) -> Vec<StepId> {
    let mut plan = vec![
        StepId::PropertySelection,
        StepId::LeaseTerms,
        StepId::OccupationChoice,
    ];
    if !draft.phone_on_file() {
        plan.push(StepId::PhoneNumber);
    }
    plan.push(StepId::OccupationDetails);
    plan
}

/// Live step count for the draft, 4 or 5.
pub fn total_steps(draft: &ApplicationDraft) -> usize {
    step_plan(draft).len()
}

/// Progress indicator data: `current` of `total`, both recomputed live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WizardProgress {
    pub current: usize,
    pub total: usize,
}

/// Cursor over the computed step plan.
///
/// Holds only a 1-based ordinal. When the plan shrinks because a phone was
/// collected, the cursor clamps into the recomputed plan, so the
/// occupation-details step stays terminal either way.
#[derive(Debug, Clone)]
pub struct StepSequencer {
    cursor: usize,
}

impl StepSequencer {
    pub fn new() -> Self {
        Self { cursor: 1 }
    }

    /// Ordinal of the step the wizard currently stands on, clamped into the
    /// live plan.
    pub fn current_ordinal(&self, draft: &ApplicationDraft) -> usize {
        self.cursor.min(step_plan(draft).len())
    }

    pub fn current_step(&self, draft: &ApplicationDraft) -> StepId {
        let plan = step_plan(draft);
        plan[self.cursor.min(plan.len()) - 1]
    }

    pub fn progress(&self, draft: &ApplicationDraft) -> WizardProgress {
        let total = step_plan(draft).len();
        WizardProgress {
            current: self.cursor.min(total),
            total,
        }
    }

    /// Gate the current step against the draft, then move forward one step,
    /// clamping at the end of the plan. Returns the step now current.
    pub fn advance(
        &mut self,
        draft: &ApplicationDraft,
        today: NaiveDate,
    ) -> Result<StepId, ValidationError> {
        let plan = step_plan(draft);
        let ordinal = self.cursor.min(plan.len());
        gate(plan[ordinal - 1], draft, today)?;
        self.cursor = (ordinal + 1).min(plan.len());
        Ok(plan[self.cursor - 1])
    }

    /// Move back one step, floor-clamped at step 1. Never fails; answers
    /// already on the draft stay there.
    pub fn retreat(&mut self, draft: &ApplicationDraft) -> StepId {
        let plan = step_plan(draft);
        let ordinal = self.cursor.min(plan.len());
        self.cursor = ordinal.saturating_sub(1).max(1);
        plan[self.cursor - 1]
    }
}

impl Default for StepSequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-step validation. A step's required answers must be on the draft
/// before the cursor may pass it.
fn gate(step: StepId, draft: &ApplicationDraft, today: NaiveDate) -> Result<(), ValidationError> {
    match step {
        StepId::PropertySelection => {
            if draft.property_id.is_none() {
                return Err(ValidationError::MissingField("property_id"));
            }
        }
        StepId::LeaseTerms => {
            match draft.contract_duration_months {
                None => return Err(ValidationError::MissingField("contract_duration_months")),
                Some(0) => return Err(ValidationError::NonPositiveDuration),
                Some(_) => {}
            }
            match draft.occupancy_date {
                None => return Err(ValidationError::MissingField("occupancy_date")),
                Some(date) if date < today => return Err(ValidationError::OccupancyDateInPast),
                Some(_) => {}
            }
        }
        StepId::OccupationChoice => {
            if draft.occupation_type.is_none() {
                return Err(ValidationError::MissingField("occupation_type"));
            }
        }
        StepId::PhoneNumber => {
            // Malformed values are rejected when patched in, so a phone on
            // file is always usable; only absence blocks here.
            if !draft.phone_on_file() {
                return Err(ValidationError::MissingField("phone"));
            }
        }
        // The occupation sub-flow owns its own gates.
        StepId::OccupationDetails => {}
    }
    Ok(())
}
