use async_trait::async_trait;
use chrono::NaiveDate;
use leaseflow::workflows::application::{
    ApplicationBackend, ApplicationPayload, DocumentGateway, DocumentKind, DocumentUrl,
    PendingDocument, SubmittedApplication,
};
use leaseflow::workflows::contract::{
    Contract, ContractGateway, ContractId, ContractTerms, Guarantor, GuarantorId, Party, PartyId,
    SignatureImage, SignatureRole,
};
use leaseflow::workflows::platform::GatewayError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Document store used when no platform token is configured. Uploads are
/// accepted unconditionally and minted a stable fake URL.
#[derive(Default)]
pub(crate) struct InMemoryDocumentStore {
    sequence: AtomicUsize,
}

#[async_trait]
impl DocumentGateway for InMemoryDocumentStore {
    async fn upload(
        &self,
        document: &PendingDocument,
        kind: DocumentKind,
    ) -> Result<DocumentUrl, GatewayError> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(DocumentUrl(format!(
            "https://cdn.leaseflow.dev/{}/{sequence}-{}",
            kind.wire_name(),
            document.file_name
        )))
    }
}

/// Application backend used when no platform token is configured. Accepted
/// payloads are kept in memory so the demo can show what was sent.
#[derive(Default)]
pub(crate) struct InMemoryApplicationBackend {
    submissions: Mutex<Vec<ApplicationPayload>>,
}

impl InMemoryApplicationBackend {
    pub(crate) fn submissions(&self) -> Vec<ApplicationPayload> {
        self.submissions.lock().expect("submission mutex poisoned").clone()
    }
}

#[async_trait]
impl ApplicationBackend for InMemoryApplicationBackend {
    async fn submit_application(
        &self,
        payload: ApplicationPayload,
    ) -> Result<SubmittedApplication, GatewayError> {
        let mut submissions = self.submissions.lock().expect("submission mutex poisoned");
        submissions.push(payload);
        Ok(SubmittedApplication {
            id: format!("app-{:06}", submissions.len()),
            status: "received".to_string(),
        })
    }
}

/// Contract ledger used when no platform token is configured. Signing an
/// empty slot commits it durably; signing a signed slot is rejected, like the
/// real backend would.
#[derive(Default)]
pub(crate) struct InMemoryContractLedger {
    contracts: Mutex<HashMap<ContractId, Contract>>,
}

impl InMemoryContractLedger {
    /// Ledger seeded with [`demo_contract`] so the contract routes have
    /// something to serve out of the box.
    pub(crate) fn with_demo_contract() -> Self {
        let ledger = Self::default();
        let contract = demo_contract();
        ledger
            .contracts
            .lock()
            .expect("contract mutex poisoned")
            .insert(contract.id.clone(), contract);
        ledger
    }
}

#[async_trait]
impl ContractGateway for InMemoryContractLedger {
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

/// Unsigned demo contract between fixed parties. The demo command signs it;
/// the in-memory server seeds it under `contract-demo-001`.
pub(crate) fn demo_contract() -> Contract {
    Contract::new(
        ContractId("contract-demo-001".to_string()),
        Party {
            id: PartyId("user-demo-tenant".to_string()),
            full_name: "Mariana Solis".to_string(),
            email: "mariana.solis@example.com".to_string(),
        },
        Party {
            id: PartyId("user-demo-hoster".to_string()),
            full_name: "Diego Paredes".to_string(),
            email: "diego.paredes@example.com".to_string(),
        },
        vec![Guarantor {
            id: GuarantorId("guarantor-demo-1".to_string()),
            full_name: "Lucia Mendez".to_string(),
            email: "lucia.mendez@example.com".to_string(),
        }],
        ContractTerms {
            monthly_rent: 16500,
            deposit: 16500,
            duration_months: 12,
            occupancy_date: NaiveDate::from_ymd_opt(2026, 10, 1).unwrap_or_default(),
        },
    )
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
