use serde::{Deserialize, Serialize};

use super::drive_errors::ParseWarning;

/// The three Google-native document kinds reachable through the virtual drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Doc,
    Sheet,
    Slides,
}

impl DocType {
    /// Maps a shortcut file extension (without the dot, any case) to a document type.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "gdoc" => Some(DocType::Doc),
            "gsheet" => Some(DocType::Sheet),
            "gslides" => Some(DocType::Slides),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocType::Doc => "gdoc",
            DocType::Sheet => "gsheet",
            DocType::Slides => "gslides",
        }
    }

    /// The exact Drive MIME type used in search queries.
    pub fn mime_type(self) -> &'static str {
        match self {
            DocType::Doc => "application/vnd.google-apps.document",
            DocType::Sheet => "application/vnd.google-apps.spreadsheet",
            DocType::Slides => "application/vnd.google-apps.presentation",
        }
    }
}

impl std::fmt::Display for DocType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            DocType::Doc => "Google Doc",
            DocType::Sheet => "Google Sheet",
            DocType::Slides => "Google Slides",
        };
        f.write_str(label)
    }
}

/// Output of the path parser. Never constructed with an error: problems are
/// recorded as warnings or as a missing `doc_type`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath {
    /// The path exactly as the caller supplied it.
    pub raw: String,
    pub base_name: String,
    /// Folder names between the drive root and the document, in order.
    pub folder_segments: Vec<String>,
    /// Anchored on a named root such as `Shared drives`: the first folder
    /// segment is the drive's own root folder rather than a folder inside it.
    pub named_root: bool,
    /// `None` when the extension is not one of gdoc/gsheet/gslides.
    pub doc_type: Option<DocType>,
    pub extension: String,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedPath {
    /// Normalized key for the resolution cache: `<ext>:<folders>/<name>`, with
    /// `<ext>:/<folders>/<name>` for paths under a named root.
    pub fn cache_key(&self) -> String {
        let mut key = format!("{}:", self.extension.to_ascii_lowercase());
        if self.named_root {
            key.push('/');
        }
        for segment in &self.folder_segments {
            key.push_str(segment);
            key.push('/');
        }
        key.push_str(&self.base_name);
        key
    }
}

/// One search hit from the Drive metadata service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveCandidate {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parent_id: Option<String>,
}

/// Result of looking up a single folder. A missing `parent_id` marks the drive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentInfo {
    pub name: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDocument {
    pub id: String,
    pub name: String,
    pub doc_type: DocType,
}

// =============================================================================
// STRUCTURED CONTENT
// =============================================================================

/// A styled span of text inside a paragraph or table cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRun {
    pub content: String,
    pub bold: bool,
    pub italic: bool,
}

impl TextRun {
    pub fn plain(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            bold: false,
            italic: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListMarker {
    /// Nesting depth, 0 for a top-level item.
    pub depth: usize,
    pub ordered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableCell {
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// One block of a document body. The metadata fields are mutually exclusive:
/// a block is a heading, a list item, a table, or a plain paragraph.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocBlock {
    pub runs: Vec<TextRun>,
    pub heading_level: Option<u8>,
    pub list: Option<ListMarker>,
    pub table: Option<Vec<TableRow>>,
}

impl DocBlock {
    pub fn paragraph(runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            ..Default::default()
        }
    }

    pub fn heading(level: u8, runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            heading_level: Some(level),
            ..Default::default()
        }
    }

    pub fn list_item(depth: usize, ordered: bool, runs: Vec<TextRun>) -> Self {
        Self {
            runs,
            list: Some(ListMarker { depth, ordered }),
            ..Default::default()
        }
    }

    pub fn table(rows: Vec<TableRow>) -> Self {
        Self {
            table: Some(rows),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocContent {
    pub title: String,
    pub blocks: Vec<DocBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetTab {
    pub title: String,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SheetContent {
    pub title: String,
    pub tabs: Vec<SheetTab>,
}

impl SheetContent {
    /// Narrows the spreadsheet to a single tab by exact title.
    pub fn select_tab(&self, title: &str) -> Option<SheetContent> {
        self.tabs
            .iter()
            .find(|tab| tab.title == title)
            .map(|tab| SheetContent {
                title: self.title.clone(),
                tabs: vec![tab.clone()],
            })
    }
}

/// A text-bearing element on a slide; each entry is one line of text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlideShape {
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Slide {
    pub shapes: Vec<SlideShape>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlideDeck {
    pub title: String,
    pub slides: Vec<Slide>,
}

/// Native structured payload of a document, tagged by type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredContent {
    Doc(DocContent),
    Sheet(SheetContent),
    Slides(SlideDeck),
}

impl StructuredContent {
    pub fn doc_type(&self) -> DocType {
        match self {
            StructuredContent::Doc(_) => DocType::Doc,
            StructuredContent::Sheet(_) => DocType::Sheet,
            StructuredContent::Slides(_) => DocType::Slides,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            StructuredContent::Doc(doc) => &doc.title,
            StructuredContent::Sheet(sheet) => &sheet.title,
            StructuredContent::Slides(deck) => &deck.title,
        }
    }
}

// =============================================================================
// FLATTENED OUTPUT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Markdown,
    Text,
    Csv,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Some(ExportFormat::Markdown),
            "text" | "txt" | "plain" => Some(ExportFormat::Text),
            "csv" => Some(ExportFormat::Csv),
            _ => None,
        }
    }

    pub fn is_supported_for(self, doc_type: DocType) -> bool {
        match self {
            ExportFormat::Markdown | ExportFormat::Text => true,
            ExportFormat::Csv => doc_type == DocType::Sheet,
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ExportFormat::Markdown => "markdown",
            ExportFormat::Text => "text",
            ExportFormat::Csv => "csv",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatText {
    pub format: ExportFormat,
    pub text: String,
}
