use std::sync::Arc;

use super::content_fetcher::ContentFetcher;
use super::content_flattener::flatten;
use super::document_locator::DocumentLocator;
use super::drive_config::DriveConfig;
use super::drive_errors::DriveError;
use super::drive_models::{DocType, ExportFormat, ParsedPath, StructuredContent};
use super::drive_store::{DriveContent, DriveMetadata};
use super::path_parser::PathParser;
use super::resolution_cache::ResolutionCache;

/// Entry point for the tool layer: parse, locate, fetch, flatten.
///
/// Holds no per-request state, so one instance can serve concurrent calls
/// behind an `Arc`. The resolution cache, when enabled, is the only shared
/// mutable state.
pub struct DriveService<M: DriveMetadata, C: DriveContent> {
    parser: PathParser,
    locator: DocumentLocator<M>,
    fetcher: ContentFetcher<C>,
    cache: Option<Arc<ResolutionCache>>,
}

impl<M, C> DriveService<M, C>
where
    M: DriveMetadata,
    C: DriveContent,
{
    pub fn new(metadata: M, content: C, config: &DriveConfig) -> Self {
        let cache = config.cache_enabled.then(|| Arc::new(ResolutionCache::new()));

        let mut locator = DocumentLocator::new(metadata, config);
        if let Some(cache) = &cache {
            locator = locator.with_cache(Arc::clone(cache));
        }

        Self {
            parser: PathParser::new(config.root_labels.clone())
                .with_named_roots(config.named_root_labels.clone()),
            locator,
            fetcher: ContentFetcher::new(content, config),
            cache,
        }
    }

    /// A Google Doc as markdown.
    pub async fn read_doc(&self, path: &str) -> Result<String, DriveError> {
        self.run(path, Some(DocType::Doc), ExportFormat::Markdown, None)
            .await
    }

    /// A Google Sheet as pipe-delimited table text, one section per tab.
    pub async fn read_sheet(&self, path: &str) -> Result<String, DriveError> {
        self.run(path, Some(DocType::Sheet), ExportFormat::Markdown, None)
            .await
    }

    /// A Google Slides deck as plain text with slide markers.
    pub async fn read_slides(&self, path: &str) -> Result<String, DriveError> {
        self.run(path, Some(DocType::Slides), ExportFormat::Text, None)
            .await
    }

    pub async fn export(&self, path: &str, format: ExportFormat) -> Result<String, DriveError> {
        self.run(path, None, format, None).await
    }

    /// Like [`DriveService::export`], optionally narrowing a spreadsheet to one tab.
    pub async fn export_with_sheet(
        &self,
        path: &str,
        format: ExportFormat,
        sheet: Option<&str>,
    ) -> Result<String, DriveError> {
        self.run(path, None, format, sheet).await
    }

    pub fn cache(&self) -> Option<&Arc<ResolutionCache>> {
        self.cache.as_ref()
    }

    async fn run(
        &self,
        path: &str,
        expected: Option<DocType>,
        format: ExportFormat,
        sheet: Option<&str>,
    ) -> Result<String, DriveError> {
        let parsed = self.parser.parse(path);
        for warning in &parsed.warnings {
            tracing::warn!("Path '{}': {}", path, warning);
        }

        let doc_type = self.validate(&parsed, expected, format, sheet)?;

        let resolved = self.locator.locate(&parsed).await?;

        let content = match self.fetcher.fetch(&resolved).await {
            Ok(content) => content,
            Err(err) => {
                // A cached id that now 404s means the file moved or was deleted.
                if let (DriveError::Fetch { source, .. }, Some(cache)) = (&err, &self.cache) {
                    if source.is_not_found() && cache.invalidate(&resolved.id) > 0 {
                        tracing::info!("Dropped stale cache entry for {}", resolved.id);
                    }
                }
                return Err(err);
            }
        };

        let content = match sheet {
            Some(tab) => select_sheet_tab(path, content, tab)?,
            None => content,
        };

        let flat = flatten(&content, format).map_err(|err| DriveError::MalformedContent {
            document_id: resolved.id.clone(),
            reason: err.0,
        })?;

        tracing::info!(
            "Flattened {} {} to {} ({} characters)",
            doc_type,
            resolved.id,
            flat.format,
            flat.text.len()
        );
        Ok(flat.text)
    }

    /// Rejects type and format mismatches before any remote call is made.
    fn validate(
        &self,
        parsed: &ParsedPath,
        expected: Option<DocType>,
        format: ExportFormat,
        sheet: Option<&str>,
    ) -> Result<DocType, DriveError> {
        let doc_type = parsed.doc_type.ok_or_else(|| DriveError::UnsupportedType {
            path: parsed.raw.clone(),
            extension: parsed.extension.clone(),
        })?;

        if let Some(expected) = expected {
            if expected != doc_type {
                return Err(DriveError::type_mismatch(&parsed.raw, expected, doc_type));
            }
        }

        if !format.is_supported_for(doc_type) {
            return Err(DriveError::format_mismatch(&parsed.raw, format, doc_type));
        }

        if sheet.is_some() && doc_type != DocType::Sheet {
            return Err(DriveError::Validation {
                path: parsed.raw.clone(),
                reason: format!("A sheet name only applies to spreadsheets, not {}", doc_type),
            });
        }

        Ok(doc_type)
    }
}

fn select_sheet_tab(
    path: &str,
    content: StructuredContent,
    tab: &str,
) -> Result<StructuredContent, DriveError> {
    let spreadsheet = match content {
        StructuredContent::Sheet(spreadsheet) => spreadsheet,
        other => return Ok(other),
    };

    match spreadsheet.select_tab(tab) {
        Some(selected) => Ok(StructuredContent::Sheet(selected)),
        None => {
            let available: Vec<&str> = spreadsheet.tabs.iter().map(|t| t.title.as_str()).collect();
            Err(DriveError::Validation {
                path: path.to_string(),
                reason: format!(
                    "Sheet '{}' not found (available: {})",
                    tab,
                    available.join(", ")
                ),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::drive::test_support::MockDrive;
    use crate::core::drive::{
        DocBlock, DocContent, SheetContent, SheetTab, Slide, SlideDeck, SlideShape, TextRun,
    };
    use std::sync::atomic::Ordering;

    const DOC_MIME: &str = "application/vnd.google-apps.document";
    const SHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
    const SLIDES_MIME: &str = "application/vnd.google-apps.presentation";

    fn drive() -> Arc<MockDrive> {
        let mut drive = MockDrive::new();
        drive.add_folder("root", "My Drive", None);
        drive.add_folder("projects", "Projects", Some("root"));

        drive.add_file("plan", "Plan", DOC_MIME, Some("projects"));
        drive.set_content(
            "plan",
            StructuredContent::Doc(DocContent {
                title: "Plan".to_string(),
                blocks: vec![
                    DocBlock::heading(2, vec![TextRun::plain("Intro\n")]),
                    DocBlock::list_item(0, false, vec![TextRun::plain("Scope\n")]),
                    DocBlock::list_item(0, false, vec![TextRun::plain("Budget\n")]),
                ],
            }),
        );

        drive.add_file("people", "People", SHEET_MIME, Some("projects"));
        drive.set_content(
            "people",
            StructuredContent::Sheet(SheetContent {
                title: "People".to_string(),
                tabs: vec![
                    SheetTab {
                        title: "Staff".to_string(),
                        rows: vec![
                            vec!["Name".to_string(), "Age".to_string()],
                            vec!["Ann".to_string(), "30".to_string()],
                            vec!["Bo, Jr.".to_string(), "25".to_string()],
                        ],
                    },
                    SheetTab {
                        title: "Guests".to_string(),
                        rows: vec![vec!["Cy".to_string()]],
                    },
                ],
            }),
        );

        drive.add_file("deck", "Kickoff", SLIDES_MIME, Some("projects"));
        drive.set_content(
            "deck",
            StructuredContent::Slides(SlideDeck {
                title: "Kickoff".to_string(),
                slides: vec![Slide {
                    shapes: vec![SlideShape {
                        lines: vec!["Hello".to_string()],
                    }],
                }],
            }),
        );

        Arc::new(drive)
    }

    fn service(drive: &Arc<MockDrive>, config: DriveConfig) -> DriveService<Arc<MockDrive>, Arc<MockDrive>> {
        DriveService::new(Arc::clone(drive), Arc::clone(drive), &config)
    }

    #[tokio::test]
    async fn test_read_doc_end_to_end() {
        let drive = drive();
        let service = service(&drive, DriveConfig::default());

        let text = service
            .read_doc(r"G:\My Drive\Projects\Plan.gdoc")
            .await
            .unwrap();
        assert_eq!(text, "## Intro\n\n- Scope\n- Budget");
    }

    #[tokio::test]
    async fn test_read_sheet_and_slides() {
        let drive = drive();
        let service = service(&drive, DriveConfig::default());

        let sheet = service
            .read_sheet(r"G:\My Drive\Projects\People.gsheet")
            .await
            .unwrap();
        assert!(sheet.starts_with(
            "Spreadsheet: People\n\n## Sheet: Staff\n\n| Name | Age |\n| --- | --- |"
        ));
        assert!(sheet.contains("## Sheet: Guests"));

        let slides = service
            .read_slides(r"G:\My Drive\Projects\Kickoff.gslides")
            .await
            .unwrap();
        assert_eq!(slides, "Presentation: Kickoff\n\n--- Slide 1 ---\nHello");
    }

    #[tokio::test]
    async fn test_export_sheet_to_csv_and_by_tab() {
        let drive = drive();
        let service = service(&drive, DriveConfig::default());
        let path = r"G:\My Drive\Projects\People.gsheet";

        let csv = service.export(path, ExportFormat::Csv).await.unwrap();
        assert_eq!(csv, "Name,Age\nAnn,30\n\"Bo, Jr.\",25");

        let guests = service
            .export_with_sheet(path, ExportFormat::Csv, Some("Guests"))
            .await
            .unwrap();
        assert_eq!(guests, "Cy");

        let err = service
            .export_with_sheet(path, ExportFormat::Csv, Some("Vendors"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains("Staff, Guests"));
    }

    #[tokio::test]
    async fn test_csv_for_doc_is_rejected_before_any_remote_call() {
        let drive = drive();
        let service = service(&drive, DriveConfig::default());

        let err = service
            .export(r"G:\My Drive\Projects\Plan.gdoc", ExportFormat::Csv)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "validation");
        assert_eq!(drive.search_calls.load(Ordering::SeqCst), 0);
        assert_eq!(drive.content_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_read_doc_on_sheet_path_is_rejected() {
        let drive = drive();
        let service = service(&drive, DriveConfig::default());

        let err = service
            .read_doc(r"G:\My Drive\Projects\People.gsheet")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert!(err.to_string().contains(".gdoc"));
    }

    #[tokio::test]
    async fn test_unsupported_extension_and_missing_document() {
        let drive = drive();
        let service = service(&drive, DriveConfig::default());

        let err = service
            .export(r"G:\My Drive\Projects\Plan.pdf", ExportFormat::Text)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unsupported_type");

        let path = r"G:\My Drive\Projects\Nope.gdoc";
        let err = service.read_doc(path).await.unwrap_err();
        assert_eq!(err.kind(), "not_found");
        assert!(err.to_string().contains(path));
    }

    #[tokio::test]
    async fn test_malformed_content_carries_document_id() {
        let mut broken = MockDrive::new();
        broken.add_folder("root", "My Drive", None);
        broken.add_file("bad", "Bad", DOC_MIME, Some("root"));
        broken.set_content(
            "bad",
            StructuredContent::Doc(DocContent {
                title: "Bad".to_string(),
                blocks: vec![DocBlock::heading(0, vec![TextRun::plain("x")])],
            }),
        );
        let drive = Arc::new(broken);
        let service = service(&drive, DriveConfig::default());

        let err = service
            .read_doc(r"G:\My Drive\Bad.gdoc")
            .await
            .unwrap_err();
        match err {
            DriveError::MalformedContent { document_id, .. } => assert_eq!(document_id, "bad"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cache_entry_dropped_when_document_disappears() {
        let mut gone = MockDrive::new();
        gone.add_folder("root", "My Drive", None);
        gone.add_file("ghost", "Ghost", DOC_MIME, Some("root"));
        // No content registered: fetch answers 404.
        let drive = Arc::new(gone);
        let config = DriveConfig {
            cache_enabled: true,
            ..Default::default()
        };
        let service = service(&drive, config);

        let err = service
            .read_doc(r"G:\My Drive\Ghost.gdoc")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "fetch");
        assert_eq!(service.cache().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_reads_share_one_service() {
        let drive = drive();
        let config = DriveConfig {
            cache_enabled: true,
            ..Default::default()
        };
        let service = Arc::new(service(&drive, config));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service.read_doc(r"G:\My Drive\Projects\Plan.gdoc").await
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "## Intro\n\n- Scope\n- Budget");
        }
        assert_eq!(service.cache().unwrap().len(), 1);
        // Only resolution is cached; content is fetched fresh every time.
        assert_eq!(drive.content_calls.load(Ordering::SeqCst), 8);
    }
}
