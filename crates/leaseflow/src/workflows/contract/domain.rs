use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for contracts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractId(pub String);

/// Identifier of a tenant or hoster account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyId(pub String);

/// Identifier of a guarantor record on a contract.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GuarantorId(pub String);

/// Tenant or hoster identity as carried on the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub full_name: String,
    pub email: String,
}

/// Guarantor listed on the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guarantor {
    pub id: GuarantorId,
    pub full_name: String,
    pub email: String,
}

/// Key lease terms carried on the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTerms {
    pub monthly_rent: u32,
    pub deposit: u32,
    pub duration_months: u32,
    pub occupancy_date: NaiveDate,
}

/// Captured signature image, as a data URL or storage URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureImage(pub String);

/// One guarantor's signature slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuarantorSignature {
    pub signed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<SignatureImage>,
}

/// Signature slots for every legal party on the contract.
///
/// Invariant: the guarantor keys are exactly the contract's guarantor id
/// set; [`Contract::ensure_integrity`] checks this on every snapshot taken
/// from the wire. A signed slot is immutable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureBook {
    pub tenant_signed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_signature: Option<SignatureImage>,
    pub hoster_signed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hoster_signature: Option<SignatureImage>,
    pub guarantors: BTreeMap<GuarantorId, GuarantorSignature>,
}

impl SignatureBook {
    /// Empty book with one unsigned slot per guarantor.
    pub fn for_guarantors<'a>(ids: impl IntoIterator<Item = &'a GuarantorId>) -> Self {
        Self {
            guarantors: ids
                .into_iter()
                .map(|id| (id.clone(), GuarantorSignature::default()))
                .collect(),
            ..Self::default()
        }
    }
}

/// Which party a signature is submitted as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureRole {
    Tenant,
    Hoster,
    Guarantor,
}

impl SignatureRole {
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::Hoster => "hoster",
            Self::Guarantor => "guarantor",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Tenant => "Tenant",
            Self::Hoster => "Hoster",
            Self::Guarantor => "Guarantor",
        }
    }
}

/// A lease contract between tenant and hoster, possibly backed by
/// guarantors. Created server-side; clients only read snapshots and submit
/// signatures, and completion is inferred from the book on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub tenant: Party,
    pub hoster: Party,
    pub guarantors: Vec<Guarantor>,
    pub terms: ContractTerms,
    pub signatures: SignatureBook,
}

impl Contract {
    /// Fresh unsigned contract with a signature book aligned to the
    /// guarantor list.
    pub fn new(
        id: ContractId,
        tenant: Party,
        hoster: Party,
        guarantors: Vec<Guarantor>,
        terms: ContractTerms,
    ) -> Self {
        let signatures = SignatureBook::for_guarantors(guarantors.iter().map(|g| &g.id));
        Self {
            id,
            tenant,
            hoster,
            guarantors,
            terms,
            signatures,
        }
    }

    /// Verify the signature book keys match the guarantor id set exactly,
    /// with no orphaned or missing entries.
    pub fn ensure_integrity(&self) -> Result<(), ContractError> {
        let expected: BTreeSet<&GuarantorId> = self.guarantors.iter().map(|g| &g.id).collect();
        let found: BTreeSet<&GuarantorId> = self.signatures.guarantors.keys().collect();
        if expected != found {
            return Err(ContractError::MisalignedSignatureBook);
        }
        Ok(())
    }

    /// Whether the slot for the given role (and guarantor, for the
    /// guarantor role) is already signed.
    pub fn slot_signed(
        &self,
        role: SignatureRole,
        guarantor_id: Option<&GuarantorId>,
    ) -> Result<bool, ContractError> {
        match role {
            SignatureRole::Tenant => Ok(self.signatures.tenant_signed),
            SignatureRole::Hoster => Ok(self.signatures.hoster_signed),
            SignatureRole::Guarantor => {
                let id = guarantor_id.ok_or(ContractError::MissingGuarantorId)?;
                self.signatures
                    .guarantors
                    .get(id)
                    .map(|slot| slot.signed)
                    .ok_or(ContractError::UnknownGuarantor)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("signature book does not match the contract's guarantors")]
    MisalignedSignatureBook,
    #[error("guarantor is not listed on this contract")]
    UnknownGuarantor,
    #[error("guarantor signature requires a guarantor id")]
    MissingGuarantorId,
    #[error("this signature slot is already signed")]
    SlotAlreadySigned,
}
