//! MCP server exposing the Drive tools to agents such as Gemini CLI.
//!
//! Every tool forwards its arguments to a [`FunctionCallHandler`] and returns
//! the handler's `{"success", ...}` payload as the tool result text.
//!
//! Test with MCP inspector:
//!   npx @modelcontextprotocol/inspector cargo run

use std::sync::Arc;

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde_json::{json, Value};

use super::drive_tools::{
    EXPORT_DOCUMENT, FORMAT_ARG, PATH_ARG, READ_DOC, READ_SHEETS, READ_SLIDES, SHEET_ARG,
};
use super::models::{ExportDocumentRequest, FunctionCallHandler, ReadDocumentRequest};

#[derive(Clone)]
pub struct DriveMcp {
    handler: Arc<dyn FunctionCallHandler>,
    tool_router: ToolRouter<Self>,
}

impl DriveMcp {
    pub fn new(handler: Arc<dyn FunctionCallHandler>) -> Self {
        Self {
            handler,
            tool_router: Self::tool_router(),
        }
    }

    async fn call(&self, name: &str, args: Value) -> String {
        match self.handler.handle_function_call(name, &args).await {
            Ok(result) => result.to_string(),
            Err(message) => {
                tracing::warn!("Rejected {} call: {}", name, message);
                json!({
                    "success": false,
                    "error": {
                        "kind": "validation",
                        "message": message,
                    },
                })
                .to_string()
            }
        }
    }
}

#[tool_router]
impl DriveMcp {
    #[tool(description = "Reads a Google Doc from its Drive shortcut path (.gdoc) and returns it as markdown.")]
    async fn read_google_doc(&self, Parameters(req): Parameters<ReadDocumentRequest>) -> String {
        self.call(READ_DOC, json!({ PATH_ARG: req.document_name_in_filesystem }))
            .await
    }

    #[tool(description = "Reads every tab of a Google Sheet from its Drive shortcut path (.gsheet) as a table.")]
    async fn read_google_sheets(&self, Parameters(req): Parameters<ReadDocumentRequest>) -> String {
        self.call(READ_SHEETS, json!({ PATH_ARG: req.document_name_in_filesystem }))
            .await
    }

    #[tool(description = "Reads the text of every slide in a Google Slides deck from its Drive shortcut path (.gslides).")]
    async fn read_google_slides(&self, Parameters(req): Parameters<ReadDocumentRequest>) -> String {
        self.call(READ_SLIDES, json!({ PATH_ARG: req.document_name_in_filesystem }))
            .await
    }

    #[tool(description = "Exports a Google Doc, Sheet or Slides deck to markdown, plain text or CSV (CSV for Sheets only).")]
    async fn export_google_document(
        &self,
        Parameters(req): Parameters<ExportDocumentRequest>,
    ) -> String {
        self.call(
            EXPORT_DOCUMENT,
            json!({
                PATH_ARG: req.document_name_in_filesystem,
                FORMAT_ARG: req.format,
                SHEET_ARG: req.sheet,
            }),
        )
        .await
    }
}

#[tool_handler]
impl ServerHandler for DriveMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build()).with_instructions(
            "Reads Google Docs, Sheets and Slides given the local path of their virtual-drive shortcut file (.gdoc, .gsheet, .gslides).",
        )
    }
}
