use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::models::FunctionCallHandler;
use crate::core::drive::{DriveContent, DriveError, DriveMetadata, DriveService, ExportFormat};

pub const READ_DOC: &str = "read_google_doc";
pub const READ_SHEETS: &str = "read_google_sheets";
pub const READ_SLIDES: &str = "read_google_slides";
pub const EXPORT_DOCUMENT: &str = "export_google_document";

pub const PATH_ARG: &str = "document_name_in_filesystem";
pub const FORMAT_ARG: &str = "format";
pub const SHEET_ARG: &str = "sheet";

/// The four Drive tools, backed by one shared [`DriveService`].
pub struct DriveToolHandler<M: DriveMetadata, C: DriveContent> {
    service: Arc<DriveService<M, C>>,
}

impl<M: DriveMetadata, C: DriveContent> DriveToolHandler<M, C> {
    pub fn new(service: Arc<DriveService<M, C>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<M, C> FunctionCallHandler for DriveToolHandler<M, C>
where
    M: DriveMetadata + 'static,
    C: DriveContent + 'static,
{
    async fn handle_function_call(&self, name: &str, args: &Value) -> Result<Value, String> {
        let path = match name {
            READ_DOC | READ_SHEETS | READ_SLIDES | EXPORT_DOCUMENT => path_arg(args)?,
            other => return Err(format!("Unknown function: '{}'", other)),
        };

        let outcome = match name {
            READ_DOC => self.service.read_doc(path).await,
            READ_SHEETS => self.service.read_sheet(path).await,
            READ_SLIDES => self.service.read_slides(path).await,
            _ => match export_format(path, args) {
                Ok(format) => {
                    let sheet = args.get(SHEET_ARG).and_then(|v| v.as_str());
                    self.service.export_with_sheet(path, format, sheet).await
                }
                Err(err) => Err(err),
            },
        };

        Ok(match outcome {
            Ok(content) => json!({
                "success": true,
                "content": content,
            }),
            Err(err) => {
                tracing::error!("{} failed for '{}': {}", name, path, err);
                json!({
                    "success": false,
                    "error": {
                        "kind": err.kind(),
                        "message": err.to_string(),
                    },
                })
            }
        })
    }

    fn supported_functions(&self) -> Vec<String> {
        [READ_DOC, READ_SHEETS, READ_SLIDES, EXPORT_DOCUMENT]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

fn path_arg(args: &Value) -> Result<&str, String> {
    args.get(PATH_ARG)
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| format!("Missing '{}' argument", PATH_ARG))
}

fn export_format(path: &str, args: &Value) -> Result<ExportFormat, DriveError> {
    match args.get(FORMAT_ARG).and_then(|v| v.as_str()) {
        None => Ok(ExportFormat::Markdown),
        Some(raw) => ExportFormat::parse(raw).ok_or_else(|| DriveError::Validation {
            path: path.to_string(),
            reason: format!(
                "Unsupported format '{}': expected markdown, text or csv",
                raw
            ),
        }),
    }
}
