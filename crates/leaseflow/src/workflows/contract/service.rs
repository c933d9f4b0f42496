use std::sync::Arc;

use serde::Serialize;

use crate::workflows::platform::GatewayError;

use super::domain::{Contract, ContractError, ContractId, GuarantorId, SignatureRole};
use super::gateway::ContractGateway;
use super::progress::{can_sign, guarantor_for_viewer, progress, SignatureProgress, Viewer};
use super::signing::{run_signature_batch, SignatureRequest, SignatureRunError, SignatureRunReport};

/// Completion metrics for one contract, derived from a fresh snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractProgressView {
    pub contract_id: ContractId,
    pub progress: SignatureProgress,
}

/// One signature slot as the signing screen renders it. A signed slot is
/// immutable and must render read-only regardless of who is looking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureSlotView {
    pub role: SignatureRole,
    pub role_label: &'static str,
    pub party_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guarantor_id: Option<GuarantorId>,
    pub signed: bool,
    pub viewer_may_sign: bool,
}

/// Everything the signing screen needs for one viewer: every slot, its
/// signed state, and whether this viewer may sign it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SigningEntitlements {
    pub contract_id: ContractId,
    pub slots: Vec<SignatureSlotView>,
    pub progress: SignatureProgress,
}

/// Contract-side workflow facade: snapshot reads with integrity checking,
/// viewer entitlement views, and entitlement-checked signature runs.
pub struct ContractService<G> {
    gateway: Arc<G>,
}

impl<G> ContractService<G>
where
    G: ContractGateway + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    async fn fetch_checked(&self, id: &ContractId) -> Result<Contract, ContractServiceError> {
        let contract = self
            .gateway
            .fetch_contract(id)
            .await
            .map_err(ContractServiceError::Fetch)?;
        contract.ensure_integrity()?;
        Ok(contract)
    }

    /// Signature completion for the contract, computed from a fresh snapshot.
    pub async fn progress(&self, id: &ContractId) -> Result<ContractProgressView, ContractServiceError> {
        let contract = self.fetch_checked(id).await?;
        Ok(ContractProgressView {
            contract_id: contract.id.clone(),
            progress: progress(&contract),
        })
    }

    /// Slot-by-slot signing view for one viewer.
    pub async fn entitlements(
        &self,
        id: &ContractId,
        viewer: &Viewer,
    ) -> Result<SigningEntitlements, ContractServiceError> {
        let contract = self.fetch_checked(id).await?;

        let mut slots = Vec::with_capacity(2 + contract.guarantors.len());
        slots.push(slot_view(
            SignatureRole::Tenant,
            contract.tenant.full_name.clone(),
            None,
            contract.signatures.tenant_signed,
            can_sign(&contract, viewer, SignatureRole::Tenant),
        ));
        slots.push(slot_view(
            SignatureRole::Hoster,
            contract.hoster.full_name.clone(),
            None,
            contract.signatures.hoster_signed,
            can_sign(&contract, viewer, SignatureRole::Hoster),
        ));

        let viewer_guarantor = guarantor_for_viewer(&contract, viewer).map(|g| g.id.clone());
        for guarantor in &contract.guarantors {
            let signed = contract
                .signatures
                .guarantors
                .get(&guarantor.id)
                .is_some_and(|slot| slot.signed);
            let mine = viewer_guarantor.as_ref() == Some(&guarantor.id);
            slots.push(slot_view(
                SignatureRole::Guarantor,
                guarantor.full_name.clone(),
                Some(guarantor.id.clone()),
                signed,
                mine,
            ));
        }

        Ok(SigningEntitlements {
            contract_id: contract.id.clone(),
            slots,
            progress: progress(&contract),
        })
    }

    /// Run a signature batch for this viewer, one sequential call per
    /// signature. Every request is entitlement-checked against a fresh
    /// snapshot before the first call goes out; a guarantor request is bound
    /// to the guarantor record matching the viewer's email, and may omit the
    /// guarantor id to have it resolved.
    pub async fn run_signatures(
        &self,
        id: &ContractId,
        viewer: &Viewer,
        requests: Vec<SignatureRequest>,
    ) -> Result<SignatureRunReport, ContractServiceError> {
        if requests.is_empty() {
            return Err(ContractServiceError::EmptyRun);
        }
        let contract = self.fetch_checked(id).await?;

        let mut resolved = Vec::with_capacity(requests.len());
        for mut request in requests {
            match request.role {
                SignatureRole::Tenant | SignatureRole::Hoster => {
                    if !can_sign(&contract, viewer, request.role) {
                        return Err(ContractServiceError::NotEntitled(request.role));
                    }
                }
                SignatureRole::Guarantor => {
                    let mine = guarantor_for_viewer(&contract, viewer)
                        .ok_or(ContractServiceError::NotEntitled(SignatureRole::Guarantor))?;
                    match &request.guarantor_id {
                        Some(requested) if requested != &mine.id => {
                            return Err(ContractServiceError::NotEntitled(
                                SignatureRole::Guarantor,
                            ));
                        }
                        Some(_) => {}
                        None => request.guarantor_id = Some(mine.id.clone()),
                    }
                }
            }
            resolved.push(request);
        }

        let report = run_signature_batch(self.gateway.as_ref(), contract, &resolved).await?;
        Ok(report)
    }
}

fn slot_view(
    role: SignatureRole,
    party_name: String,
    guarantor_id: Option<GuarantorId>,
    signed: bool,
    entitled: bool,
) -> SignatureSlotView {
    SignatureSlotView {
        role,
        role_label: role.label(),
        party_name,
        guarantor_id,
        signed,
        // A signed slot stays read-only even for the party who owns it.
        viewer_may_sign: entitled && !signed,
    }
}

/// Error raised by the contract service.
#[derive(Debug, thiserror::Error)]
pub enum ContractServiceError {
    #[error("contract could not be fetched: {0}")]
    Fetch(#[source] GatewayError),
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error("not entitled to sign as {}", .0.wire_name())]
    NotEntitled(SignatureRole),
    #[error("a signature run needs at least one signature")]
    EmptyRun,
    #[error(transparent)]
    Run(#[from] SignatureRunError),
}
