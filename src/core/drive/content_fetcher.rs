use std::time::Duration;

use super::document_locator::with_timeout;
use super::drive_config::DriveConfig;
use super::drive_errors::DriveError;
use super::drive_models::{DocType, ResolvedDocument, StructuredContent};
use super::drive_store::DriveContent;

/// Pulls the native structured payload for a resolved document.
///
/// No interpretation happens here; the only check is that the collaborator
/// returned the variant that matches the requested type.
pub struct ContentFetcher<C: DriveContent> {
    content: C,
    call_timeout: Duration,
}

impl<C: DriveContent> ContentFetcher<C> {
    pub fn new(content: C, config: &DriveConfig) -> Self {
        Self {
            content,
            call_timeout: config.call_timeout,
        }
    }

    pub async fn fetch(&self, resolved: &ResolvedDocument) -> Result<StructuredContent, DriveError> {
        let id = resolved.id.as_str();
        let (operation, call) = match resolved.doc_type {
            DocType::Doc => ("Docs content fetch", self.content.get_doc_content(id)),
            DocType::Sheet => ("Sheets content fetch", self.content.get_sheet_content(id)),
            DocType::Slides => ("Slides content fetch", self.content.get_slides_content(id)),
        };

        tracing::debug!("{} for document {}", operation, id);

        let content = with_timeout(self.call_timeout, call)
            .await
            .map_err(|source| DriveError::Fetch {
                operation,
                target: format!("document {}", id),
                source,
            })?;

        if content.doc_type() != resolved.doc_type {
            return Err(DriveError::MalformedContent {
                document_id: resolved.id.clone(),
                reason: format!(
                    "expected {} content, received {}",
                    resolved.doc_type,
                    content.doc_type()
                ),
            });
        }

        tracing::info!(
            "Fetched {} '{}' ({})",
            resolved.doc_type,
            content.title(),
            resolved.id
        );
        Ok(content)
    }
}
