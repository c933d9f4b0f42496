use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::config::VerificationConfig;

use super::domain::{DraftPatch, ValidationError, WizardId};
use super::gateway::{ApplicationBackend, DocumentGateway, SubmittedApplication};
use super::submission::{self, SubmissionError};
use super::upload::upload_pending_documents;
use super::verification::{VerificationUpdate, WidgetEvent, WidgetMount};
use super::wizard::{ApplicationWizard, WizardSnapshot};

/// Front desk for wizard sessions: opens and closes them, routes patches,
/// step actions, and widget events to the right session, and runs the
/// upload plus submit pipeline once a wizard finishes.
///
/// Sessions live in process memory only; a restart loses every open draft.
pub struct ApplicationDesk<D, B> {
    sessions: Mutex<HashMap<WizardId, ApplicationWizard>>,
    documents: Arc<D>,
    backend: Arc<B>,
    verification: VerificationConfig,
}

static WIZARD_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_wizard_id() -> WizardId {
    let id = WIZARD_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    WizardId(format!("wiz-{id:06}"))
}

impl<D, B> ApplicationDesk<D, B>
where
    D: DocumentGateway + 'static,
    B: ApplicationBackend + 'static,
{
    pub fn new(documents: Arc<D>, backend: Arc<B>, verification: VerificationConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            documents,
            backend,
            verification,
        }
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<WizardId, ApplicationWizard>> {
        self.sessions.lock().expect("wizard sessions mutex poisoned")
    }

    /// Open a fresh wizard session with an empty draft.
    pub fn open_wizard(&self) -> (WizardId, WizardSnapshot) {
        let id = next_wizard_id();
        let wizard = ApplicationWizard::open(self.verification.clone());
        let snapshot = wizard.snapshot();
        self.lock_sessions().insert(id.clone(), wizard);
        info!(wizard = %id.0, "application wizard opened");
        (id, snapshot)
    }

    pub fn snapshot(&self, id: &WizardId) -> Result<WizardSnapshot, DeskError> {
        let sessions = self.lock_sessions();
        let wizard = sessions.get(id).ok_or(DeskError::UnknownWizard)?;
        Ok(wizard.snapshot())
    }

    pub fn apply_patch(
        &self,
        id: &WizardId,
        patch: DraftPatch,
    ) -> Result<WizardSnapshot, DeskError> {
        let mut sessions = self.lock_sessions();
        let wizard = sessions.get_mut(id).ok_or(DeskError::UnknownWizard)?;
        wizard.apply_patch(patch)?;
        Ok(wizard.snapshot())
    }

    pub fn advance(&self, id: &WizardId, today: NaiveDate) -> Result<WizardSnapshot, DeskError> {
        let mut sessions = self.lock_sessions();
        let wizard = sessions.get_mut(id).ok_or(DeskError::UnknownWizard)?;
        wizard.advance(today)?;
        Ok(wizard.snapshot())
    }

    pub fn retreat(&self, id: &WizardId) -> Result<WizardSnapshot, DeskError> {
        let mut sessions = self.lock_sessions();
        let wizard = sessions.get_mut(id).ok_or(DeskError::UnknownWizard)?;
        wizard.retreat();
        Ok(wizard.snapshot())
    }

    /// Widget mount parameters for the verification pass currently due.
    pub fn verification_mount(&self, id: &WizardId) -> Result<WidgetMount, DeskError> {
        let mut sessions = self.lock_sessions();
        let wizard = sessions.get_mut(id).ok_or(DeskError::UnknownWizard)?;
        wizard
            .verification_mount()
            .ok_or(DeskError::VerificationInactive)
    }

    /// Report a widget event. `Ok(None)` means the event was absorbed with
    /// nothing for the client to act on.
    pub fn verification_event(
        &self,
        id: &WizardId,
        event: WidgetEvent,
    ) -> Result<Option<VerificationUpdate>, DeskError> {
        let mut sessions = self.lock_sessions();
        let wizard = sessions.get_mut(id).ok_or(DeskError::UnknownWizard)?;
        if !wizard.verification_active() {
            return Err(DeskError::VerificationInactive);
        }
        let update = wizard.verification_event(event);
        match &update {
            Some(VerificationUpdate::GuardianVerified { .. }) => {
                debug!(wizard = %id.0, "guardian verification pass completed");
            }
            Some(VerificationUpdate::Completed { .. }) => {
                info!(wizard = %id.0, "identity verification completed");
            }
            _ => {}
        }
        Ok(update)
    }

    /// Upload pending documents, assemble the payload, and create the
    /// application on the backend. The session is removed on success and
    /// kept for another attempt on failure.
    pub async fn submit(&self, id: &WizardId) -> Result<SubmittedApplication, DeskError> {
        // Clone the draft so the session lock is not held across the
        // gateway calls.
        let draft = {
            let sessions = self.lock_sessions();
            let wizard = sessions.get(id).ok_or(DeskError::UnknownWizard)?;
            if !wizard.is_complete() {
                return Err(DeskError::WizardIncomplete);
            }
            wizard.draft().clone()
        };

        let uploaded = upload_pending_documents(self.documents.as_ref(), &draft)
            .await
            .map_err(SubmissionError::from)?;
        let payload = submission::assemble(&draft, &uploaded)?;
        let submitted = self
            .backend
            .submit_application(payload)
            .await
            .map_err(SubmissionError::Backend)?;

        self.lock_sessions().remove(id);
        info!(wizard = %id.0, application = %submitted.id, "application submitted");
        Ok(submitted)
    }

    /// Close a wizard and discard its draft and progress.
    pub fn abandon(&self, id: &WizardId) -> Result<(), DeskError> {
        match self.lock_sessions().remove(id) {
            Some(_) => {
                info!(wizard = %id.0, "application wizard abandoned");
                Ok(())
            }
            None => Err(DeskError::UnknownWizard),
        }
    }
}

/// Error raised by the application desk.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("wizard session not found")]
    UnknownWizard,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("application wizard has not finished all steps")]
    WizardIncomplete,
    #[error("identity verification is not active for this wizard")]
    VerificationInactive,
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}
