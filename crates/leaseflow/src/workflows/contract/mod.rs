//! Contract signature workflow: per-party signature slots over a lease
//! contract, completion progress derived on every read, viewer entitlement
//! checks, and the sequential signature submission runner. Contracts are
//! created server-side; this module only reads snapshots and pushes
//! signatures through the platform gateway.

pub mod domain;
pub mod gateway;
pub mod progress;
pub mod router;
pub mod service;
pub mod signing;

#[cfg(test)]
mod tests;

pub use domain::{
    Contract, ContractError, ContractId, ContractTerms, Guarantor, GuarantorId,
    GuarantorSignature, Party, PartyId, SignatureBook, SignatureImage, SignatureRole,
};
pub use gateway::ContractGateway;
pub use progress::{can_sign, guarantor_for_viewer, progress, SignatureProgress, Viewer};
pub use router::contract_router;
pub use service::{
    ContractProgressView, ContractService, ContractServiceError, SignatureSlotView,
    SigningEntitlements,
};
pub use signing::{
    run_signature_batch, SignatureFailure, SignatureRequest, SignatureRunError,
    SignatureRunReport,
};
