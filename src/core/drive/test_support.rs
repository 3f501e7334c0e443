// In-memory Drive used by the core tests. Search compares names
// case-insensitively to behave like the real `files.list` query.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;

use super::drive_errors::ClientError;
use super::drive_models::{DriveCandidate, ParentInfo, StructuredContent};
use super::drive_store::{DriveContent, DriveMetadata};

pub struct MockDrive {
    files: Vec<DriveCandidate>,
    folders: DashMap<String, ParentInfo>,
    contents: DashMap<String, StructuredContent>,
    content_failures: DashMap<String, ClientError>,
    search_failure: Option<ClientError>,
    delay: Option<Duration>,
    pub search_calls: AtomicUsize,
    pub parent_calls: AtomicUsize,
    pub content_calls: AtomicUsize,
}

impl MockDrive {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            folders: DashMap::new(),
            contents: DashMap::new(),
            content_failures: DashMap::new(),
            search_failure: None,
            delay: None,
            search_calls: AtomicUsize::new(0),
            parent_calls: AtomicUsize::new(0),
            content_calls: AtomicUsize::new(0),
        }
    }

    pub fn add_folder(&mut self, id: &str, name: &str, parent: Option<&str>) {
        self.folders.insert(
            id.to_string(),
            ParentInfo {
                name: name.to_string(),
                parent_id: parent.map(str::to_string),
            },
        );
    }

    pub fn add_file(&mut self, id: &str, name: &str, mime_type: &str, parent: Option<&str>) {
        self.files.push(DriveCandidate {
            id: id.to_string(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            parent_id: parent.map(str::to_string),
        });
    }

    pub fn set_content(&mut self, id: &str, content: StructuredContent) {
        self.contents.insert(id.to_string(), content);
    }

    pub fn fail_content(&mut self, id: &str, error: ClientError) {
        self.content_failures.insert(id.to_string(), error);
    }

    pub fn fail_search(&mut self, error: ClientError) {
        self.search_failure = Some(error);
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = Some(delay);
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    async fn content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        self.content_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(error) = self.content_failures.get(id) {
            return Err(error.value().clone());
        }
        self.contents
            .get(id)
            .map(|c| c.value().clone())
            .ok_or_else(|| ClientError::Status {
                status: 404,
                message: format!("File not found: {}", id),
            })
    }
}

#[async_trait]
impl DriveMetadata for MockDrive {
    async fn search_documents(
        &self,
        name: &str,
        mime_type: &str,
    ) -> Result<Vec<DriveCandidate>, ClientError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        if let Some(error) = &self.search_failure {
            return Err(error.clone());
        }
        Ok(self
            .files
            .iter()
            .filter(|f| f.name.eq_ignore_ascii_case(name) && f.mime_type == mime_type)
            .cloned()
            .collect())
    }

    async fn get_parent(&self, folder_id: &str) -> Result<ParentInfo, ClientError> {
        self.parent_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        self.folders
            .get(folder_id)
            .map(|f| f.value().clone())
            .ok_or_else(|| ClientError::Status {
                status: 404,
                message: format!("Folder not found: {}", folder_id),
            })
    }
}

#[async_trait]
impl DriveContent for MockDrive {
    async fn get_doc_content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        self.content(id).await
    }

    async fn get_sheet_content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        self.content(id).await
    }

    async fn get_slides_content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        self.content(id).await
    }
}
