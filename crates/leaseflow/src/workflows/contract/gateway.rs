use async_trait::async_trait;
use serde::Serialize;

use crate::workflows::platform::{GatewayError, PlatformClient};

use super::domain::{Contract, ContractId, GuarantorId, SignatureImage, SignatureRole};

/// Platform abstraction for contract reads and signature submission, so the
/// signing runner and the service can be exercised without the backend.
///
/// `sign` submits exactly one signature and returns the contract snapshot
/// the platform holds afterwards. The runner relies on that snapshot being
/// the authoritative state, including signatures committed by earlier calls
/// in the same batch.
#[async_trait]
pub trait ContractGateway: Send + Sync {
    async fn fetch_contract(&self, id: &ContractId) -> Result<Contract, GatewayError>;

    async fn sign(
        &self,
        id: &ContractId,
        role: SignatureRole,
        guarantor_id: Option<&GuarantorId>,
        signature: &SignatureImage,
    ) -> Result<Contract, GatewayError>;
}

#[derive(Debug, Serialize)]
struct SignRequestBody<'a> {
    signature_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    guarantor_id: Option<&'a GuarantorId>,
    signature_image: &'a SignatureImage,
}

#[async_trait]
impl ContractGateway for PlatformClient {
    async fn fetch_contract(&self, id: &ContractId) -> Result<Contract, GatewayError> {
        let response = self
            .http()
            .get(self.endpoint(&format!("api/v1/contracts/{}", id.0)))
            .send()
            .await?;
        let response = PlatformClient::check(response).await?;
        Ok(response.json().await?)
    }

    async fn sign(
        &self,
        id: &ContractId,
        role: SignatureRole,
        guarantor_id: Option<&GuarantorId>,
        signature: &SignatureImage,
    ) -> Result<Contract, GatewayError> {
        let body = SignRequestBody {
            signature_type: role.wire_name(),
            guarantor_id,
            signature_image: signature,
        };
        let response = self
            .http()
            .post(self.endpoint(&format!("api/v1/contracts/{}/signatures", id.0)))
            .json(&body)
            .send()
            .await?;
        let response = PlatformClient::check(response).await?;
        Ok(response.json().await?)
    }
}
