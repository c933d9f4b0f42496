use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::workflows::contract::domain::{
    Contract, ContractId, ContractTerms, Guarantor, GuarantorId, Party, PartyId, SignatureImage,
    SignatureRole,
};
use crate::workflows::contract::gateway::ContractGateway;
use crate::workflows::contract::progress::Viewer;
use crate::workflows::contract::service::ContractService;
use crate::workflows::platform::GatewayError;

pub(super) fn terms() -> ContractTerms {
    ContractTerms {
        monthly_rent: 14500,
        deposit: 14500,
        duration_months: 12,
        occupancy_date: NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date"),
    }
}

pub(super) fn tenant() -> Party {
    Party {
        id: PartyId("user-tenant-1".to_string()),
        full_name: "Valeria Ortiz".to_string(),
        email: "valeria.ortiz@example.com".to_string(),
    }
}

pub(super) fn hoster() -> Party {
    Party {
        id: PartyId("user-hoster-1".to_string()),
        full_name: "Hugo Navarro".to_string(),
        email: "hugo.navarro@example.com".to_string(),
    }
}

pub(super) fn guarantor(index: usize) -> Guarantor {
    Guarantor {
        id: GuarantorId(format!("guarantor-{index}")),
        full_name: format!("Guarantor {index}"),
        email: format!("guarantor{index}@example.com"),
    }
}

/// Unsigned contract between the fixture tenant and hoster with `count`
/// guarantors.
pub(super) fn contract_with_guarantors(count: usize) -> Contract {
    let guarantors = (1..=count).map(guarantor).collect();
    Contract::new(
        ContractId("contract-001".to_string()),
        tenant(),
        hoster(),
        guarantors,
        terms(),
    )
}

pub(super) fn signature() -> SignatureImage {
    SignatureImage("data:image/png;base64,iVBORw0KGgo=".to_string())
}

pub(super) fn tenant_viewer() -> Viewer {
    Viewer {
        user_id: PartyId("user-tenant-1".to_string()),
        email: "valeria.ortiz@example.com".to_string(),
    }
}

pub(super) fn hoster_viewer() -> Viewer {
    Viewer {
        user_id: PartyId("user-hoster-1".to_string()),
        email: "hugo.navarro@example.com".to_string(),
    }
}

pub(super) fn guarantor_viewer(index: usize) -> Viewer {
    Viewer {
        user_id: PartyId(format!("user-guarantor-{index}")),
        email: format!("guarantor{index}@example.com"),
    }
}

pub(super) fn stranger() -> Viewer {
    Viewer {
        user_id: PartyId("user-stranger".to_string()),
        email: "nobody@example.com".to_string(),
    }
}

/// In-memory stand-in for the platform's contract endpoints. Behaves like
/// the backend: signing an empty slot commits it durably, signing a signed
/// slot is rejected, and each call returns the stored snapshot.
#[derive(Default)]
pub(super) struct MemoryContracts {
    contracts: Mutex<HashMap<ContractId, Contract>>,
    sign_calls: AtomicUsize,
    fail_role: Mutex<Option<SignatureRole>>,
}

impl MemoryContracts {
    pub(super) fn with_contract(contract: Contract) -> Arc<Self> {
        let store = Self::default();
        store
            .contracts
            .lock()
            .expect("contract mutex poisoned")
            .insert(contract.id.clone(), contract);
        Arc::new(store)
    }

    /// Make every signature submitted as `role` fail at the gateway.
    pub(super) fn fail_signing_as(&self, role: SignatureRole) {
        *self.fail_role.lock().expect("fail mutex poisoned") = Some(role);
    }

    pub(super) fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::Relaxed)
    }

    pub(super) fn stored(&self, id: &ContractId) -> Option<Contract> {
        self.contracts
            .lock()
            .expect("contract mutex poisoned")
            .get(id)
            .cloned()
    }
}

#[async_trait]
impl ContractGateway for MemoryContracts {
    async fn fetch_contract(&self, id: &ContractId) -> Result<Contract, GatewayError> {
        self.contracts
            .lock()
            .expect("contract mutex poisoned")
            .get(id)
            .cloned()
            .ok_or(GatewayError::Rejected {
                status: 404,
                message: "contract not found".to_string(),
            })
    }

    async fn sign(
        &self,
        id: &ContractId,
        role: SignatureRole,
        guarantor_id: Option<&GuarantorId>,
        signature: &SignatureImage,
    ) -> Result<Contract, GatewayError> {
        self.sign_calls.fetch_add(1, Ordering::Relaxed);
        if *self.fail_role.lock().expect("fail mutex poisoned") == Some(role) {
            return Err(GatewayError::Rejected {
                status: 500,
                message: "signature ledger unavailable".to_string(),
            });
        }

        let mut contracts = self.contracts.lock().expect("contract mutex poisoned");
        let contract = contracts.get_mut(id).ok_or(GatewayError::Rejected {
            status: 404,
            message: "contract not found".to_string(),
        })?;

        let already_signed = GatewayError::Rejected {
            status: 409,
            message: "slot already signed".to_string(),
        };
        match role {
            SignatureRole::Tenant => {
                if contract.signatures.tenant_signed {
                    return Err(already_signed);
                }
                contract.signatures.tenant_signed = true;
                contract.signatures.tenant_signature = Some(signature.clone());
            }
            SignatureRole::Hoster => {
                if contract.signatures.hoster_signed {
                    return Err(already_signed);
                }
                contract.signatures.hoster_signed = true;
                contract.signatures.hoster_signature = Some(signature.clone());
            }
            SignatureRole::Guarantor => {
                let guarantor_id = guarantor_id.ok_or(GatewayError::Rejected {
                    status: 400,
                    message: "guarantor id required".to_string(),
                })?;
                let slot = contract.signatures.guarantors.get_mut(guarantor_id).ok_or(
                    GatewayError::Rejected {
                        status: 422,
                        message: "guarantor is not on this contract".to_string(),
                    },
                )?;
                if slot.signed {
                    return Err(already_signed);
                }
                slot.signed = true;
                slot.signature = Some(signature.clone());
            }
        }
        Ok(contract.clone())
    }
}

pub(super) fn build_service(
    contract: Contract,
) -> (Arc<ContractService<MemoryContracts>>, Arc<MemoryContracts>) {
    let gateway = MemoryContracts::with_contract(contract);
    let service = Arc::new(ContractService::new(gateway.clone()));
    (service, gateway)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
