use std::sync::Arc;

use async_trait::async_trait;

use super::drive_errors::ClientError;
use super::drive_models::{DriveCandidate, ParentInfo, StructuredContent};

/// Metadata lookups the locator needs from the remote Drive.
#[async_trait]
pub trait DriveMetadata: Send + Sync {
    /// Non-trashed files with this name and MIME type, in the service's order.
    async fn search_documents(
        &self,
        name: &str,
        mime_type: &str,
    ) -> Result<Vec<DriveCandidate>, ClientError>;

    /// Name and parent of a folder. `parent_id` is `None` for the drive root.
    async fn get_parent(&self, folder_id: &str) -> Result<ParentInfo, ClientError>;
}

/// Content retrieval, one call per document type.
#[async_trait]
pub trait DriveContent: Send + Sync {
    async fn get_doc_content(&self, id: &str) -> Result<StructuredContent, ClientError>;
    async fn get_sheet_content(&self, id: &str) -> Result<StructuredContent, ClientError>;
    async fn get_slides_content(&self, id: &str) -> Result<StructuredContent, ClientError>;
}

// Let one client instance back both the locator and the fetcher.
#[async_trait]
impl<T: DriveMetadata + ?Sized> DriveMetadata for Arc<T> {
    async fn search_documents(
        &self,
        name: &str,
        mime_type: &str,
    ) -> Result<Vec<DriveCandidate>, ClientError> {
        (**self).search_documents(name, mime_type).await
    }

    async fn get_parent(&self, folder_id: &str) -> Result<ParentInfo, ClientError> {
        (**self).get_parent(folder_id).await
    }
}

#[async_trait]
impl<T: DriveContent + ?Sized> DriveContent for Arc<T> {
    async fn get_doc_content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        (**self).get_doc_content(id).await
    }

    async fn get_sheet_content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        (**self).get_sheet_content(id).await
    }

    async fn get_slides_content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        (**self).get_slides_content(id).await
    }
}
