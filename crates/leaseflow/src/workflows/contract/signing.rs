use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::workflows::platform::GatewayError;

use super::domain::{Contract, ContractError, GuarantorId, SignatureImage, SignatureRole};
use super::gateway::ContractGateway;
use super::progress::{progress, SignatureProgress};

/// One signature to submit: the role it is signed as, the guarantor slot
/// when the role is guarantor, and the captured signature image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequest {
    pub role: SignatureRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guarantor_id: Option<GuarantorId>,
    pub signature: SignatureImage,
}

/// Outcome of a signature run in which every request went through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRunReport {
    /// Latest contract snapshot returned by the final call.
    pub contract: Contract,
    /// Number of signatures committed in this run.
    pub committed: usize,
    /// Progress over the final snapshot.
    pub progress: SignatureProgress,
}

/// What stopped a signature call.
#[derive(Debug, thiserror::Error)]
pub enum SignatureFailure {
    /// Local rejection before any network call: the slot is already signed,
    /// the guarantor is unknown, or the returned snapshot is inconsistent.
    #[error(transparent)]
    Contract(#[from] ContractError),
    /// The platform rejected the call or could not be reached. The message
    /// is surfaced as received.
    #[error("{0}")]
    Gateway(GatewayError),
}

/// A signature run that stopped partway.
///
/// Everything committed before the failing call stands on the platform;
/// `latest` is the snapshot accumulated so far so callers can re-render
/// without another fetch. Retrying means re-submitting only what is left.
#[derive(Debug, thiserror::Error)]
#[error("could not sign as {}: {source}", role.wire_name())]
pub struct SignatureRunError {
    pub role: SignatureRole,
    /// Signatures committed by earlier calls in this run. Not rolled back.
    pub committed: usize,
    /// Most recent contract snapshot before the failure.
    pub latest: Box<Contract>,
    #[source]
    pub source: SignatureFailure,
}

/// Submit a batch of signatures one call at a time, in the given order.
///
/// Each call replaces the working snapshot with the contract the platform
/// returned, and the next request is validated against that snapshot. This
/// is deliberately sequential; unlike the document upload join, signatures
/// are independently durable and a mid-batch failure keeps what was already
/// signed.
pub async fn run_signature_batch<G>(
    gateway: &G,
    contract: Contract,
    requests: &[SignatureRequest],
) -> Result<SignatureRunReport, SignatureRunError>
where
    G: ContractGateway + ?Sized,
{
    let mut latest = contract;
    let mut committed = 0usize;

    for request in requests {
        // Signed slots are immutable; bounce before touching the network.
        if let Err(error) = check_slot(&latest, request) {
            return Err(SignatureRunError {
                role: request.role,
                committed,
                latest: Box::new(latest),
                source: SignatureFailure::Contract(error),
            });
        }

        debug!(
            contract = %latest.id.0,
            role = request.role.wire_name(),
            "submitting signature"
        );
        let snapshot = gateway
            .sign(
                &latest.id,
                request.role,
                request.guarantor_id.as_ref(),
                &request.signature,
            )
            .await
            .map_err(|error| SignatureRunError {
                role: request.role,
                committed,
                latest: Box::new(latest.clone()),
                source: SignatureFailure::Gateway(error),
            })?;

        if let Err(error) = snapshot.ensure_integrity() {
            return Err(SignatureRunError {
                role: request.role,
                committed: committed + 1,
                latest: Box::new(snapshot),
                source: SignatureFailure::Contract(error),
            });
        }

        latest = snapshot;
        committed += 1;
    }

    let progress = progress(&latest);
    info!(
        contract = %latest.id.0,
        committed,
        signed = progress.completed,
        total = progress.total,
        "signature run finished"
    );
    Ok(SignatureRunReport {
        contract: latest,
        committed,
        progress,
    })
}

fn check_slot(contract: &Contract, request: &SignatureRequest) -> Result<(), ContractError> {
    if contract.slot_signed(request.role, request.guarantor_id.as_ref())? {
        return Err(ContractError::SlotAlreadySigned);
    }
    Ok(())
}
