//! Tool argument types and the handler trait the MCP server dispatches to.

use async_trait::async_trait;
use rmcp::schemars;
use serde::Deserialize;
use serde_json::Value;

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Arguments of the three read tools.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct ReadDocumentRequest {
    /// Full local path of the shortcut file
    #[schemars(
        description = "Full local path of the shortcut file, e.g. G:\\My Drive\\Projects\\Plan.gdoc"
    )]
    pub document_name_in_filesystem: String,
}

/// Arguments of `export_google_document`.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
pub struct ExportDocumentRequest {
    #[schemars(
        description = "Full local path of the .gdoc, .gsheet or .gslides shortcut file"
    )]
    pub document_name_in_filesystem: String,
    /// markdown, text or csv
    #[schemars(
        description = "Output format: markdown, text or csv (csv for Sheets only). Defaults to markdown."
    )]
    #[serde(default)]
    pub format: Option<String>,
    #[schemars(
        description = "Spreadsheet tab to export. Defaults to all tabs, or the first tab for CSV."
    )]
    #[serde(default)]
    pub sheet: Option<String>,
}

// =============================================================================
// HANDLER
// =============================================================================

/// Executes tool calls by name.
///
/// `Err` is reserved for calls that could not be dispatched at all (unknown
/// tool, missing argument). Failures of the operation itself come back as an
/// `Ok` payload with `"success": false` so the agent can read the reason.
#[async_trait]
pub trait FunctionCallHandler: Send + Sync {
    async fn handle_function_call(&self, name: &str, args: &Value) -> Result<Value, String>;

    fn supported_functions(&self) -> Vec<String>;
}
