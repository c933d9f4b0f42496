use serde::Serialize;

use super::domain::{Contract, Guarantor, PartyId, SignatureRole};

/// Completion metrics over a contract's signature slots, derived on every
/// read rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignatureProgress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

/// Count signed slots against the full party set. Pure: calling it twice on
/// the same contract yields identical output.
///
/// `total` is tenant plus hoster plus one per guarantor. The percentage is
/// conventional rounding, except that 100 is reserved for a fully signed
/// contract; a not-quite-done book caps at 99.
pub fn progress(contract: &Contract) -> SignatureProgress {
    let total = 2 + contract.guarantors.len();
    let mut completed = 0;
    if contract.signatures.tenant_signed {
        completed += 1;
    }
    if contract.signatures.hoster_signed {
        completed += 1;
    }
    completed += contract
        .signatures
        .guarantors
        .values()
        .filter(|slot| slot.signed)
        .count();

    let percentage = if completed == total {
        100
    } else {
        let rounded = ((completed * 100) as f64 / total as f64).round() as u8;
        rounded.min(99)
    };

    SignatureProgress {
        completed,
        total,
        percentage,
    }
}

/// The signed-in user looking at the signing screen.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, Serialize)]
pub struct Viewer {
    pub user_id: PartyId,
    pub email: String,
}

/// Whether the viewer is entitled to sign the given role on this contract.
///
/// Tenant and hoster bind by account id. Guarantors bind by case-insensitive
/// email match only; there is no stronger invite-token binding.
pub fn can_sign(contract: &Contract, viewer: &Viewer, role: SignatureRole) -> bool {
    match role {
        SignatureRole::Tenant => contract.tenant.id == viewer.user_id,
        SignatureRole::Hoster => contract.hoster.id == viewer.user_id,
        SignatureRole::Guarantor => guarantor_for_viewer(contract, viewer).is_some(),
    }
}

/// The guarantor record whose email matches the viewer's, if any.
pub fn guarantor_for_viewer<'a>(contract: &'a Contract, viewer: &Viewer) -> Option<&'a Guarantor> {
    let email = viewer.email.trim();
    contract
        .guarantors
        .iter()
        .find(|guarantor| guarantor.email.trim().eq_ignore_ascii_case(email))
}
