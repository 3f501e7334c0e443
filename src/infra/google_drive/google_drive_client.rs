use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::google_auth::GoogleAuth;
use crate::core::drive::{
    ClientError, DocBlock, DocContent, DriveCandidate, DriveContent, DriveMetadata, ParentInfo,
    SheetContent, SheetTab, Slide, SlideDeck, SlideShape, StructuredContent, TableCell, TableRow,
    TextRun,
};

const DRIVE_API: &str = "https://www.googleapis.com/drive/v3";
const DOCS_API: &str = "https://docs.googleapis.com/v1";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4";
const SLIDES_API: &str = "https://slides.googleapis.com/v1";

const SEARCH_PAGE_SIZE: &str = "100";
const MAX_SEARCH_PAGES: usize = 5;

/// Google vertical tab; Docs and Slides use it for soft line breaks.
const SOFT_BREAK: char = '\u{000b}';

/// REST client for Drive v3 plus the Docs, Sheets and Slides read APIs.
pub struct GoogleDriveClient {
    client: Client,
    auth: GoogleAuth,
}

impl GoogleDriveClient {
    pub fn new(auth: GoogleAuth, request_timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent("drive-doc-reader/0.1")
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        tracing::info!("Google Drive client authenticating with {}", auth.describe());
        Ok(Self { client, auth })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let token = self.auth.access_token().await?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClientError::Http(format!("request timed out: {}", e))
                } else {
                    ClientError::Http(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!("Google API {} returned {}: {}", url, status, body);
            return Err(status_error(status, &body));
        }

        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DriveMetadata for GoogleDriveClient {
    async fn search_documents(
        &self,
        name: &str,
        mime_type: &str,
    ) -> Result<Vec<DriveCandidate>, ClientError> {
        let url = format!("{}/files", DRIVE_API);
        let url = url.as_str();
        let query = search_query(name, mime_type);
        let client = self;

        let paged = collect_pages(MAX_SEARCH_PAGES, move |page_token| {
            let mut params = vec![
                ("q", query.clone()),
                (
                    "fields",
                    "nextPageToken, files(id, name, mimeType, parents)".to_string(),
                ),
                ("pageSize", SEARCH_PAGE_SIZE.to_string()),
                ("orderBy", "createdTime".to_string()),
                ("spaces", "drive".to_string()),
                ("supportsAllDrives", "true".to_string()),
                ("includeItemsFromAllDrives", "true".to_string()),
            ];
            if let Some(token) = page_token {
                params.push(("pageToken", token));
            }

            async move {
                let page: ApiFileList = client.get_json(url, &params).await?;
                let files: Vec<DriveCandidate> =
                    page.files.into_iter().map(map_candidate).collect();
                Ok::<_, ClientError>((files, page.next_page_token))
            }
        })
        .await?;

        if paged.truncated {
            tracing::warn!(
                "Drive search for '{}' stopped after {} pages; later candidates were not checked",
                name,
                MAX_SEARCH_PAGES
            );
        }

        tracing::debug!(
            "Drive search for '{}' returned {} candidate(s)",
            name,
            paged.items.len()
        );
        Ok(paged.items)
    }

    async fn get_parent(&self, folder_id: &str) -> Result<ParentInfo, ClientError> {
        let url = format!("{}/files/{}", DRIVE_API, folder_id);
        let file: ApiFile = self
            .get_json(
                &url,
                &[
                    ("fields", "id,name,parents".to_string()),
                    ("supportsAllDrives", "true".to_string()),
                ],
            )
            .await?;

        Ok(ParentInfo {
            name: file.name,
            parent_id: file.parents.into_iter().next(),
        })
    }
}

#[async_trait]
impl DriveContent for GoogleDriveClient {
    async fn get_doc_content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        let url = format!("{}/documents/{}", DOCS_API, id);
        let doc: ApiDocument = self
            .get_json(&url, &[("includeTabsContent", "true".to_string())])
            .await?;
        Ok(StructuredContent::Doc(map_document(doc)))
    }

    async fn get_sheet_content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        let url = format!("{}/spreadsheets/{}", SHEETS_API, id);
        let meta: ApiSpreadsheet = self
            .get_json(
                &url,
                &[(
                    "fields",
                    "properties.title,sheets.properties(title,sheetType)".to_string(),
                )],
            )
            .await?;

        let titles: Vec<String> = meta
            .sheets
            .into_iter()
            .filter_map(|s| s.properties)
            .filter(|p| p.sheet_type.as_deref().map_or(true, |t| t == "GRID"))
            .map(|p| p.title)
            .collect();

        let mut value_ranges = Vec::new();
        if !titles.is_empty() {
            let mut params: Vec<(&str, String)> = titles
                .iter()
                .map(|title| ("ranges", quote_sheet_title(title)))
                .collect();
            params.push(("majorDimension", "ROWS".to_string()));
            params.push(("valueRenderOption", "FORMATTED_VALUE".to_string()));

            let batch: ApiBatchValues = self
                .get_json(&format!("{}/values:batchGet", url), &params)
                .await?;
            value_ranges = batch.value_ranges;
        }

        let title = meta.properties.map(|p| p.title).unwrap_or_default();
        Ok(StructuredContent::Sheet(map_spreadsheet(
            title,
            titles,
            value_ranges,
        )))
    }

    async fn get_slides_content(&self, id: &str) -> Result<StructuredContent, ClientError> {
        let url = format!("{}/presentations/{}", SLIDES_API, id);
        let presentation: ApiPresentation = self.get_json(&url, &[]).await?;
        Ok(StructuredContent::Slides(map_presentation(presentation)))
    }
}

// =============================================================================
// REQUEST HELPERS
// =============================================================================

/// Items gathered by [`collect_pages`].
struct Paged<T> {
    items: Vec<T>,
    /// The page cap was reached while the service still offered a next page.
    truncated: bool,
}

/// Follows page tokens until the service stops returning one or `max_pages`
/// pages have been fetched.
async fn collect_pages<T, F, Fut>(max_pages: usize, mut fetch: F) -> Result<Paged<T>, ClientError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, Option<String>), ClientError>>,
{
    let mut items = Vec::new();
    let mut page_token = None;

    for _ in 0..max_pages {
        let (page, next) = fetch(page_token.take()).await?;
        items.extend(page);
        match next {
            Some(token) => page_token = Some(token),
            None => {
                return Ok(Paged {
                    items,
                    truncated: false,
                })
            }
        }
    }

    Ok(Paged {
        items,
        truncated: page_token.is_some(),
    })
}

/// Drive query string literals escape backslash and single quote.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn search_query(name: &str, mime_type: &str) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escape_query_value(name),
        escape_query_value(mime_type)
    )
}

/// A1 notation for a whole tab: `'Q1 ''24'`.
fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn status_error(status: StatusCode, body: &str) -> ClientError {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        });

    let hint = match status {
        StatusCode::FORBIDDEN => {
            " (check that the file is shared with the authenticated account and the API is enabled)"
        }
        StatusCode::NOT_FOUND => " (file not found or not visible to the authenticated account)",
        StatusCode::TOO_MANY_REQUESTS => " (quota exceeded, retry later)",
        _ => "",
    };

    ClientError::Status {
        status: status.as_u16(),
        message: format!("{}{}", detail, hint),
    }
}

// =============================================================================
// RESPONSE MAPPING
// =============================================================================

fn map_candidate(file: ApiFile) -> DriveCandidate {
    DriveCandidate {
        id: file.id,
        name: file.name,
        mime_type: file.mime_type,
        parent_id: file.parents.into_iter().next(),
    }
}

fn map_document(doc: ApiDocument) -> DocContent {
    let mut blocks = Vec::new();

    if doc.tabs.is_empty() {
        push_body_blocks(doc.body.as_ref(), &doc.lists, &mut blocks);
    } else {
        let mut tabs = Vec::new();
        collect_tabs(&doc.tabs, &mut tabs);
        let label_tabs = tabs.len() > 1;

        for tab in tabs {
            if label_tabs {
                let title = tab
                    .tab_properties
                    .as_ref()
                    .map(|p| p.title.clone())
                    .unwrap_or_default();
                if !title.trim().is_empty() {
                    blocks.push(DocBlock::heading(1, vec![TextRun::plain(title)]));
                }
            }
            if let Some(document_tab) = &tab.document_tab {
                push_body_blocks(document_tab.body.as_ref(), &document_tab.lists, &mut blocks);
            }
        }
    }

    DocContent {
        title: doc.title,
        blocks,
    }
}

fn collect_tabs<'a>(tabs: &'a [ApiTab], out: &mut Vec<&'a ApiTab>) {
    for tab in tabs {
        out.push(tab);
        collect_tabs(&tab.child_tabs, out);
    }
}

fn push_body_blocks(
    body: Option<&ApiBody>,
    lists: &HashMap<String, ApiList>,
    out: &mut Vec<DocBlock>,
) {
    let Some(body) = body else {
        return;
    };

    for element in &body.content {
        if let Some(paragraph) = &element.paragraph {
            out.push(map_paragraph(paragraph, lists));
        } else if let Some(table) = &element.table {
            let rows = table
                .table_rows
                .iter()
                .map(|row| TableRow {
                    cells: row
                        .table_cells
                        .iter()
                        .map(|cell| TableCell {
                            runs: cell
                                .content
                                .iter()
                                .filter_map(|e| e.paragraph.as_ref())
                                .flat_map(|p| paragraph_runs(p))
                                .collect(),
                        })
                        .collect(),
                })
                .collect::<Vec<_>>();
            if !rows.is_empty() {
                out.push(DocBlock::table(rows));
            }
        }
    }
}

fn paragraph_runs(paragraph: &ApiParagraph) -> Vec<TextRun> {
    paragraph
        .elements
        .iter()
        .filter_map(|e| e.text_run.as_ref())
        .map(|run| {
            let style = run.text_style.as_ref();
            TextRun {
                content: run
                    .content
                    .as_deref()
                    .unwrap_or_default()
                    .replace(SOFT_BREAK, "\n"),
                bold: style.and_then(|s| s.bold).unwrap_or(false),
                italic: style.and_then(|s| s.italic).unwrap_or(false),
            }
        })
        .collect()
}

fn map_paragraph(paragraph: &ApiParagraph, lists: &HashMap<String, ApiList>) -> DocBlock {
    let runs = paragraph_runs(paragraph);

    // A bulleted heading is rendered as a list item.
    if let Some(bullet) = &paragraph.bullet {
        let depth = bullet.nesting_level.unwrap_or(0);
        let ordered = bullet
            .list_id
            .as_ref()
            .and_then(|id| lists.get(id))
            .and_then(|list| list.list_properties.as_ref())
            .and_then(|props| props.nesting_levels.get(depth))
            .map(is_ordered_level)
            .unwrap_or(false);
        return DocBlock::list_item(depth, ordered, runs);
    }

    let style = paragraph
        .paragraph_style
        .as_ref()
        .and_then(|s| s.named_style_type.as_deref());
    match style.and_then(heading_level) {
        Some(level) => DocBlock::heading(level, runs),
        None => DocBlock::paragraph(runs),
    }
}

fn heading_level(named_style: &str) -> Option<u8> {
    match named_style {
        "TITLE" => Some(1),
        "SUBTITLE" => Some(2),
        other => other
            .strip_prefix("HEADING_")
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| *n >= 1),
    }
}

fn is_ordered_level(level: &ApiNestingLevel) -> bool {
    if level.glyph_symbol.is_some() {
        return false;
    }
    matches!(
        level.glyph_type.as_deref(),
        Some(glyph) if glyph != "GLYPH_TYPE_UNSPECIFIED" && glyph != "NONE"
    )
}

fn map_spreadsheet(
    title: String,
    tab_titles: Vec<String>,
    value_ranges: Vec<ApiValueRange>,
) -> SheetContent {
    let mut ranges = value_ranges.into_iter();
    let tabs = tab_titles
        .into_iter()
        .map(|tab_title| {
            let rows: Vec<Vec<String>> = ranges
                .next()
                .map(|range| {
                    range
                        .values
                        .into_iter()
                        .map(|row| row.iter().map(cell_text).collect())
                        .collect()
                })
                .unwrap_or_default();
            SheetTab {
                title: tab_title,
                rows,
            }
        })
        .collect();

    SheetContent { title, tabs }
}

fn cell_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn map_presentation(presentation: ApiPresentation) -> SlideDeck {
    let slides = presentation
        .slides
        .iter()
        .map(|page| {
            let mut shapes = Vec::new();
            collect_shapes(&page.page_elements, &mut shapes);
            Slide { shapes }
        })
        .collect();

    SlideDeck {
        title: presentation.title,
        slides,
    }
}

fn collect_shapes(elements: &[ApiPageElement], out: &mut Vec<SlideShape>) {
    for element in elements {
        if let Some(text) = element.shape.as_ref().and_then(|s| s.text.as_ref()) {
            out.push(SlideShape {
                lines: text_lines(text),
            });
        }
        if let Some(table) = &element.table {
            for row in &table.table_rows {
                for cell in &row.table_cells {
                    if let Some(text) = &cell.text {
                        out.push(SlideShape {
                            lines: text_lines(text),
                        });
                    }
                }
            }
        }
        if let Some(group) = &element.element_group {
            collect_shapes(&group.children, out);
        }
    }
}

fn text_lines(text: &ApiTextContent) -> Vec<String> {
    let joined: String = text
        .text_elements
        .iter()
        .filter_map(|e| {
            e.text_run
                .as_ref()
                .or(e.auto_text.as_ref())
                .and_then(|r| r.content.as_deref())
        })
        .collect();

    joined
        .replace(SOFT_BREAK, "\n")
        .split('\n')
        .map(|line| line.to_string())
        .collect()
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFileList {
    #[serde(default)]
    files: Vec<ApiFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiFile {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    parents: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiDocument {
    #[serde(default)]
    title: String,
    body: Option<ApiBody>,
    #[serde(default)]
    lists: HashMap<String, ApiList>,
    #[serde(default)]
    tabs: Vec<ApiTab>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTab {
    tab_properties: Option<ApiTabProperties>,
    document_tab: Option<ApiDocumentTab>,
    #[serde(default)]
    child_tabs: Vec<ApiTab>,
}

#[derive(Debug, Deserialize)]
struct ApiTabProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiDocumentTab {
    body: Option<ApiBody>,
    #[serde(default)]
    lists: HashMap<String, ApiList>,
}

#[derive(Debug, Deserialize)]
struct ApiBody {
    #[serde(default)]
    content: Vec<ApiStructuralElement>,
}

#[derive(Debug, Deserialize)]
struct ApiStructuralElement {
    paragraph: Option<ApiParagraph>,
    table: Option<ApiTable>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiParagraph {
    #[serde(default)]
    elements: Vec<ApiParagraphElement>,
    paragraph_style: Option<ApiParagraphStyle>,
    bullet: Option<ApiBullet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiParagraphStyle {
    named_style_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBullet {
    list_id: Option<String>,
    nesting_level: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiParagraphElement {
    text_run: Option<ApiTextRun>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTextRun {
    content: Option<String>,
    text_style: Option<ApiTextStyle>,
}

#[derive(Debug, Deserialize)]
struct ApiTextStyle {
    bold: Option<bool>,
    italic: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTable {
    #[serde(default)]
    table_rows: Vec<ApiTableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTableRow {
    #[serde(default)]
    table_cells: Vec<ApiTableCell>,
}

#[derive(Debug, Deserialize)]
struct ApiTableCell {
    #[serde(default)]
    content: Vec<ApiStructuralElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiList {
    list_properties: Option<ApiListProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiListProperties {
    #[serde(default)]
    nesting_levels: Vec<ApiNestingLevel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiNestingLevel {
    glyph_type: Option<String>,
    glyph_symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSpreadsheet {
    properties: Option<ApiSpreadsheetProperties>,
    #[serde(default)]
    sheets: Vec<ApiSheet>,
}

#[derive(Debug, Deserialize)]
struct ApiSpreadsheetProperties {
    #[serde(default)]
    title: String,
}

#[derive(Debug, Deserialize)]
struct ApiSheet {
    properties: Option<ApiSheetProperties>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSheetProperties {
    #[serde(default)]
    title: String,
    sheet_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiBatchValues {
    #[serde(default)]
    value_ranges: Vec<ApiValueRange>,
}

#[derive(Debug, Deserialize)]
struct ApiValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPresentation {
    #[serde(default)]
    title: String,
    #[serde(default)]
    slides: Vec<ApiPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPage {
    #[serde(default)]
    page_elements: Vec<ApiPageElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPageElement {
    shape: Option<ApiShape>,
    table: Option<ApiSlidesTable>,
    element_group: Option<ApiGroup>,
}

#[derive(Debug, Deserialize)]
struct ApiShape {
    text: Option<ApiTextContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTextContent {
    #[serde(default)]
    text_elements: Vec<ApiTextElement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiTextElement {
    text_run: Option<ApiSlidesRun>,
    auto_text: Option<ApiSlidesRun>,
}

#[derive(Debug, Deserialize)]
struct ApiSlidesRun {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSlidesTable {
    #[serde(default)]
    table_rows: Vec<ApiSlidesTableRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiSlidesTableRow {
    #[serde(default)]
    table_cells: Vec<ApiSlidesTableCell>,
}

#[derive(Debug, Deserialize)]
struct ApiSlidesTableCell {
    text: Option<ApiTextContent>,
}

#[derive(Debug, Deserialize)]
struct ApiGroup {
    #[serde(default)]
    children: Vec<ApiPageElement>,
}
