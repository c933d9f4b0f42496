use futures::future::try_join_all;

use crate::workflows::platform::GatewayError;

use super::domain::{ApplicationDraft, DocumentKind, DocumentUrl, PendingDocument};
use super::gateway::DocumentGateway;

/// Slot to URL map produced by one successful upload batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadedDocuments {
    pub id_document_url: Option<DocumentUrl>,
    pub video_selfie_url: Option<DocumentUrl>,
    pub guardian_id_document_url: Option<DocumentUrl>,
    pub income_document_urls: Vec<DocumentUrl>,
    pub guardian_income_document_urls: Vec<DocumentUrl>,
}

impl UploadedDocuments {
    pub fn is_empty(&self) -> bool {
        self.id_document_url.is_none()
            && self.video_selfie_url.is_none()
            && self.guardian_id_document_url.is_none()
            && self.income_document_urls.is_empty()
            && self.guardian_income_document_urls.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("failed to upload documents: {file_name} was rejected")]
    DocumentRejected {
        kind: DocumentKind,
        file_name: String,
        #[source]
        source: GatewayError,
    },
}

enum Slot {
    Id,
    Video,
    GuardianId,
    Income,
    GuardianIncome,
}

/// Upload every pending document on the draft concurrently and collect the
/// resulting URLs.
///
/// The batch is a join with all-or-nothing semantics: one rejected upload
/// fails the whole batch and no partial map is returned. A retry re-runs the
/// full batch; earlier successes are not remembered.
pub async fn upload_pending_documents<D>(
    gateway: &D,
    draft: &ApplicationDraft,
) -> Result<UploadedDocuments, UploadError>
where
    D: DocumentGateway + ?Sized,
{
    let mut batch: Vec<(Slot, DocumentKind, &PendingDocument)> = Vec::new();
    if let Some(document) = &draft.id_document {
        batch.push((Slot::Id, DocumentKind::Id, document));
    }
    if let Some(document) = &draft.video_selfie {
        batch.push((Slot::Video, DocumentKind::Video, document));
    }
    if let Some(document) = &draft.guardian_id_document {
        batch.push((Slot::GuardianId, DocumentKind::GuardianId, document));
    }
    for document in &draft.income_documents {
        batch.push((Slot::Income, DocumentKind::Income, document));
    }
    for document in &draft.guardian_income_documents {
        batch.push((Slot::GuardianIncome, DocumentKind::Income, document));
    }

    if batch.is_empty() {
        return Ok(UploadedDocuments::default());
    }
    tracing::debug!(documents = batch.len(), "uploading application documents");

    let uploads = batch.into_iter().map(|(slot, kind, document)| async move {
        match gateway.upload(document, kind).await {
            Ok(url) => Ok((slot, url)),
            Err(source) => Err(UploadError::DocumentRejected {
                kind,
                file_name: document.file_name.clone(),
                source,
            }),
        }
    });

    // try_join_all yields results in input order, so pushing as we walk the
    // outcome keeps each array's URLs aligned with its documents.
    let mut uploaded = UploadedDocuments::default();
    for (slot, url) in try_join_all(uploads).await? {
        match slot {
            Slot::Id => uploaded.id_document_url = Some(url),
            Slot::Video => uploaded.video_selfie_url = Some(url),
            Slot::GuardianId => uploaded.guardian_id_document_url = Some(url),
            Slot::Income => uploaded.income_document_urls.push(url),
            Slot::GuardianIncome => uploaded.guardian_income_document_urls.push(url),
        }
    }
    Ok(uploaded)
}
