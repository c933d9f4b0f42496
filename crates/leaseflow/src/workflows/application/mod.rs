//! Rental application wizard: the draft aggregate, the variable-length step
//! sequencer and its occupation sub-flows, the two-phase identity
//! verification sequence, the concurrent document upload join, and the
//! submission assembler that turns a finished draft into the backend call.

pub mod domain;
pub mod gateway;
pub mod router;
pub mod sequencer;
pub mod service;
pub mod subflow;
pub mod submission;
pub mod upload;
pub mod verification;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    phone_is_valid, ApplicationDraft, DocumentKind, DocumentUrl, DraftPatch, EntrepreneurDetails,
    GuardianContact, OccupationType, PaymentResponsible, PendingDocument, ProfessionalDetails,
    PropertyId, StudentDetails, ValidationError, VerificationResult, VerificationStatus, WizardId,
};
pub use gateway::{ApplicationBackend, DocumentGateway, SubmittedApplication};
pub use router::wizard_router;
pub use sequencer::{step_plan, total_steps, StepId, StepSequencer, WizardProgress};
pub use service::{ApplicationDesk, DeskError};
pub use subflow::{Subflow, SubflowAdvance, SubflowRetreat, SubflowStep};
pub use submission::{assemble, ApplicationPayload, SubmissionError};
pub use upload::{upload_pending_documents, UploadError, UploadedDocuments};
pub use verification::{
    VerificationPhase, VerificationSequencer, VerificationUpdate, WidgetEvent, WidgetMount,
};
pub use wizard::{ApplicationWizard, SubflowSnapshot, WizardSnapshot};
