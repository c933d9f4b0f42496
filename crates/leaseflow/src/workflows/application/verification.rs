use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::VerificationConfig;

use super::domain::{VerificationResult, VerificationStatus};

/// Phase of the identity verification sequence. The guardian phase exists
/// only when the guardian pays the rent; otherwise the sequence collapses to
/// a single applicant pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPhase {
    Guardian,
    Applicant,
    Completed,
}

impl VerificationPhase {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Guardian => "Guardian verification",
            Self::Applicant => "Applicant verification",
            Self::Completed => "Verification completed",
        }
    }

    const fn pass_name(self) -> &'static str {
        match self {
            Self::Guardian => "guardian",
            Self::Applicant => "applicant",
            Self::Completed => "completed",
        }
    }
}

/// The four observable events of the external verification widget. Its
/// internals are its own; this is the whole contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WidgetEvent {
    Started,
    Finished { result: VerificationResult },
    Cancelled,
    Errored { message: String },
}

/// Parameters for mounting the external widget. The widget cannot be reused
/// across passes, so every pass (and every retry) gets a fresh mount with a
/// new nonce and metadata naming the active pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WidgetMount {
    pub client_id: String,
    pub flow_id: String,
    pub nonce: u32,
    pub metadata: BTreeMap<String, String>,
}

/// What the host should do after feeding an event into the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum VerificationUpdate {
    /// Guardian pass succeeded; mount again for the applicant pass.
    GuardianVerified {
        result: VerificationResult,
        mount: WidgetMount,
    },
    /// The last required pass succeeded. Emitted exactly once; on the
    /// guardian path the result is the applicant's with the guardian ids
    /// folded into its metadata.
    Completed { result: VerificationResult },
    /// Recoverable outcome: the phase stays put and the user may try again.
    /// `restore_ui` asks the host to bring back whatever it hid to make
    /// room for the widget.
    Retry {
        phase: VerificationPhase,
        notice: String,
        restore_ui: bool,
    },
    /// Widget or configuration fault; support-contact territory rather than
    /// a retry notice.
    Fault { message: String },
}

const FAILED_NOTICE: &str = "Identity verification did not pass. Please try again.";
const CANCELLED_NOTICE: &str = "Identity verification was cancelled. You can restart it at any time.";

/// Drives one or two passes of the external identity verification widget and
/// merges their results.
///
/// Once the completion has been emitted the sequencer goes quiet; late
/// widget events can never produce a second completion.
#[derive(Debug, Clone)]
pub struct VerificationSequencer {
    client_id: String,
    flow_id: String,
    phase: VerificationPhase,
    guardian_result: Option<VerificationResult>,
    nonce: u32,
}

impl VerificationSequencer {
    pub fn new(config: &VerificationConfig, requires_guardian: bool) -> Self {
        Self {
            client_id: config.client_id.clone(),
            flow_id: config.flow_id.clone(),
            phase: if requires_guardian {
                VerificationPhase::Guardian
            } else {
                VerificationPhase::Applicant
            },
            guardian_result: None,
            nonce: 0,
        }
    }

    pub fn phase(&self) -> VerificationPhase {
        self.phase
    }

    pub fn guardian_result(&self) -> Option<&VerificationResult> {
        self.guardian_result.as_ref()
    }

    /// Issue mount parameters for the current pass, or `None` once the
    /// sequence has completed.
    pub fn mount(&mut self) -> Option<WidgetMount> {
        if self.phase == VerificationPhase::Completed {
            return None;
        }
        Some(self.fresh_mount())
    }

    fn fresh_mount(&mut self) -> WidgetMount {
        self.nonce += 1;
        let mut metadata = BTreeMap::new();
        metadata.insert("pass".to_string(), self.phase.pass_name().to_string());
        WidgetMount {
            client_id: self.client_id.clone(),
            flow_id: self.flow_id.clone(),
            nonce: self.nonce,
            metadata,
        }
    }

    /// Feed one widget event through the state machine. Events arriving
    /// after completion are ignored.
    pub fn handle_event(&mut self, event: WidgetEvent) -> Option<VerificationUpdate> {
        if self.phase == VerificationPhase::Completed {
            return None;
        }
        match event {
            WidgetEvent::Started => None,
            WidgetEvent::Cancelled => Some(VerificationUpdate::Retry {
                phase: self.phase,
                notice: CANCELLED_NOTICE.to_string(),
                restore_ui: true,
            }),
            WidgetEvent::Errored { message } => Some(VerificationUpdate::Fault {
                message: format!(
                    "The verification service reported a problem ({message}). \
                     If this keeps happening, contact support."
                ),
            }),
            WidgetEvent::Finished { result } => self.handle_finished(result),
        }
    }

    fn handle_finished(&mut self, result: VerificationResult) -> Option<VerificationUpdate> {
        match (self.phase, result.status) {
            (VerificationPhase::Completed, _) => None,
            (VerificationPhase::Guardian, VerificationStatus::Completed) => {
                self.guardian_result = Some(result.clone());
                self.phase = VerificationPhase::Applicant;
                let mount = self.fresh_mount();
                Some(VerificationUpdate::GuardianVerified { result, mount })
            }
            (VerificationPhase::Applicant, VerificationStatus::Completed) => {
                let combined = self.combined_result(result);
                self.phase = VerificationPhase::Completed;
                Some(VerificationUpdate::Completed { result: combined })
            }
            (phase, VerificationStatus::Failed) => Some(VerificationUpdate::Retry {
                phase,
                notice: FAILED_NOTICE.to_string(),
                restore_ui: false,
            }),
            (phase, VerificationStatus::Cancelled) => Some(VerificationUpdate::Retry {
                phase,
                notice: CANCELLED_NOTICE.to_string(),
                restore_ui: true,
            }),
        }
    }

    /// On the guardian path the applicant result carries both verification
    /// ids in its metadata, so downstream consumers receive one payload.
    fn combined_result(&self, mut applicant: VerificationResult) -> VerificationResult {
        if let Some(guardian) = &self.guardian_result {
            let metadata = applicant.metadata.get_or_insert_with(BTreeMap::new);
            metadata.insert(
                "student_verification_id".to_string(),
                applicant.verification_id.clone(),
            );
            metadata.insert(
                "guardian_verification_id".to_string(),
                guardian.verification_id.clone(),
            );
            if let Some(identity_id) = &guardian.identity_id {
                metadata.insert("guardian_identity_id".to_string(), identity_id.clone());
            }
        }
        applicant
    }
}
