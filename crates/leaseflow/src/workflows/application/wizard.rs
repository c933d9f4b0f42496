use chrono::NaiveDate;
use serde::Serialize;

use crate::config::VerificationConfig;

use super::domain::{
    phone_is_valid, ApplicationDraft, DraftPatch, OccupationType, ValidationError,
};
use super::sequencer::{StepId, StepSequencer, WizardProgress};
use super::subflow::{Subflow, SubflowAdvance, SubflowRetreat, SubflowStep};
use super::verification::{
    VerificationPhase, VerificationSequencer, VerificationUpdate, WidgetEvent, WidgetMount,
};

/// One applicant's wizard session: the draft plus the sequencers walking it.
///
/// All draft mutation flows through [`ApplicationWizard::apply_patch`] and
/// the verification recording hooks; nothing else holds a draft copy.
#[derive(Debug, Clone)]
pub struct ApplicationWizard {
    draft: ApplicationDraft,
    sequencer: StepSequencer,
    subflow: Option<Subflow>,
    verification: Option<VerificationSequencer>,
    verification_config: VerificationConfig,
    complete: bool,
}

/// Serializable view of where the wizard stands, for clients rendering the
/// progress indicator and the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardSnapshot {
    pub progress: WizardProgress,
    pub step: StepId,
    pub step_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subflow: Option<SubflowSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_phase: Option<VerificationPhase>,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubflowSnapshot {
    pub occupation: OccupationType,
    pub step: SubflowStep,
    pub step_label: &'static str,
    pub ordinal: usize,
    pub total: usize,
}

impl ApplicationWizard {
    /// Open a fresh session with an empty draft on step 1.
    pub fn open(verification_config: VerificationConfig) -> Self {
        Self {
            draft: ApplicationDraft::default(),
            sequencer: StepSequencer::new(),
            subflow: None,
            verification: None,
            verification_config,
            complete: false,
        }
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Merge a patch into the draft. A malformed phone is rejected here,
    /// before it can land on the draft and shrink the step plan under a
    /// value that would only bounce at submission. Changing the payer voids
    /// recorded verification passes and restarts an armed sequencer.
    pub fn apply_patch(&mut self, patch: DraftPatch) -> Result<(), ValidationError> {
        if let Some(phone) = patch.phone.as_deref() {
            if !phone_is_valid(phone) {
                return Err(ValidationError::MalformedPhone);
            }
        }
        if let Some(occupation) = patch.occupation_type {
            // Switching occupation mid-details restarts that sub-flow; the
            // collected answers stay on the draft.
            if self.subflow.as_ref().is_some_and(|subflow| subflow.occupation() != occupation) {
                self.subflow = Some(Subflow::for_occupation(occupation));
                self.verification = None;
            }
        }
        // Who pays decides whose identity gets verified, so a payer change
        // invalidates recorded passes along with any armed sequencer.
        let payer_switched = patch
            .payment_responsible
            .is_some_and(|payer| self.draft.student.payment_responsible != Some(payer));
        self.draft.apply(patch);
        if payer_switched {
            self.draft.discard_verifications();
            if self.verification.is_some() {
                self.arm_verification();
            }
        }
        Ok(())
    }

    /// Move forward one step: the engaged sub-flow first, otherwise the
    /// top-level sequencer. Arriving on the occupation-details step engages
    /// a fresh sub-flow; arriving on its identity check arms verification.
    pub fn advance(&mut self, today: NaiveDate) -> Result<(), ValidationError> {
        if self.complete {
            return Ok(());
        }
        if let Some(subflow) = &mut self.subflow {
            match subflow.advance(&self.draft)? {
                SubflowAdvance::Completed => {
                    self.complete = true;
                    self.verification = None;
                }
                SubflowAdvance::Stepped(SubflowStep::IdentityCheck) => self.arm_verification(),
                SubflowAdvance::Stepped(_) => {}
            }
            return Ok(());
        }
        if self.sequencer.advance(&self.draft, today)? == StepId::OccupationDetails {
            self.engage_subflow();
        }
        Ok(())
    }

    /// Move back one step. Retreating off a sub-flow's first step returns
    /// control to the top-level sequencer; no answers are discarded.
    pub fn retreat(&mut self) {
        if self.complete {
            return;
        }
        if let Some(subflow) = &mut self.subflow {
            // Leaving the identity step dismounts the widget either way.
            self.verification = None;
            if subflow.retreat(&self.draft) == SubflowRetreat::ToParent {
                self.subflow = None;
                self.sequencer.retreat(&self.draft);
            }
            return;
        }
        self.sequencer.retreat(&self.draft);
    }

    pub fn verification_active(&self) -> bool {
        self.verification.is_some()
    }

    /// Mount parameters for the widget pass currently due, if any.
    pub fn verification_mount(&mut self) -> Option<WidgetMount> {
        self.verification.as_mut().and_then(VerificationSequencer::mount)
    }

    /// Feed a widget event through the verification sequencer, recording
    /// pass results on the draft as they arrive.
    pub fn verification_event(&mut self, event: WidgetEvent) -> Option<VerificationUpdate> {
        let update = self.verification.as_mut()?.handle_event(event)?;
        match &update {
            VerificationUpdate::GuardianVerified { result, .. } => {
                self.draft.record_guardian_verification(result.clone());
            }
            VerificationUpdate::Completed { result } => {
                self.draft.record_applicant_verification(result.clone());
            }
            VerificationUpdate::Retry { .. } | VerificationUpdate::Fault { .. } => {}
        }
        Some(update)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let step = self.sequencer.current_step(&self.draft);
        WizardSnapshot {
            progress: self.sequencer.progress(&self.draft),
            step,
            step_label: step.label(),
            subflow: self.subflow.as_ref().map(|subflow| {
                let sub_step = subflow.current_step(&self.draft);
                SubflowSnapshot {
                    occupation: subflow.occupation(),
                    step: sub_step,
                    step_label: sub_step.label(),
                    ordinal: subflow.current_ordinal(&self.draft),
                    total: subflow.total_steps(&self.draft),
                }
            }),
            verification_phase: self.verification.as_ref().map(VerificationSequencer::phase),
            complete: self.complete,
        }
    }

    fn engage_subflow(&mut self) {
        if let Some(occupation) = self.draft.occupation_type {
            self.subflow = Some(Subflow::for_occupation(occupation));
        }
    }

    fn arm_verification(&mut self) {
        self.verification = Some(VerificationSequencer::new(
            &self.verification_config,
            self.draft.requires_guardian_verification(),
        ));
    }
}
