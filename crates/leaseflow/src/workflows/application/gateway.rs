use async_trait::async_trait;
use reqwest::multipart;
use serde::{Deserialize, Serialize};

use crate::workflows::platform::{GatewayError, PlatformClient};

use super::domain::{DocumentKind, DocumentUrl, PendingDocument};
use super::submission::ApplicationPayload;

/// Document storage abstraction so the upload join can be exercised in
/// isolation.
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    async fn upload(
        &self,
        document: &PendingDocument,
        kind: DocumentKind,
    ) -> Result<DocumentUrl, GatewayError>;
}

/// Marketplace backend abstraction for creating the application itself.
#[async_trait]
pub trait ApplicationBackend: Send + Sync {
    async fn submit_application(
        &self,
        payload: ApplicationPayload,
    ) -> Result<SubmittedApplication, GatewayError>;
}

/// Backend acknowledgement of a created application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedApplication {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    url: String,
}

#[async_trait]
impl DocumentGateway for PlatformClient {
    async fn upload(
        &self,
        document: &PendingDocument,
        kind: DocumentKind,
    ) -> Result<DocumentUrl, GatewayError> {
        // An unparseable media type falls back to octet-stream rather than
        // sinking the whole batch.
        let media_type = document
            .media_type
            .parse::<mime::Mime>()
            .unwrap_or(mime::APPLICATION_OCTET_STREAM);
        let part = multipart::Part::bytes(document.content.clone())
            .file_name(document.file_name.clone())
            .mime_str(media_type.as_ref())?;
        let form = multipart::Form::new()
            .text("kind", kind.wire_name())
            .part("file", part);

        let response = self
            .http()
            .post(self.endpoint("api/v1/documents"))
            .multipart(form)
            .send()
            .await?;
        let response = PlatformClient::check(response).await?;
        let body: UploadResponse = response.json().await?;
        Ok(DocumentUrl(body.url))
    }
}

#[async_trait]
impl ApplicationBackend for PlatformClient {
    async fn submit_application(
        &self,
        payload: ApplicationPayload,
    ) -> Result<SubmittedApplication, GatewayError> {
        let response = self
            .http()
            .post(self.endpoint("api/v1/applications"))
            .json(&payload)
            .send()
            .await?;
        let response = PlatformClient::check(response).await?;
        Ok(response.json().await?)
    }
}
