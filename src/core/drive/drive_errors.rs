use std::time::Duration;

use thiserror::Error;

use super::drive_models::{DocType, ExportFormat};

/// Non-fatal findings from the path parser. The path is still processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    EmptyPath,
    MissingExtension,
    RootMarkerMissing,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseWarning::EmptyPath => f.write_str("path is empty"),
            ParseWarning::MissingExtension => f.write_str("file name has no extension"),
            ParseWarning::RootMarkerMissing => f.write_str(
                "no drive root marker found, treating every parent segment as a Drive folder",
            ),
        }
    }
}

/// Failures reported by the remote collaborators (search, parent lookup, content).
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("Google API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Unexpected response body: {0}")]
    Decode(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl ClientError {
    /// True when the remote service reported the file as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status: 404, .. })
    }
}

/// Raised by the flattener when content does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FlattenError(pub String);

/// Every failure the resolve-fetch-flatten pipeline can surface.
#[derive(Debug, Clone, Error)]
pub enum DriveError {
    #[error(
        "Unsupported file type '.{extension}' for {path}: expected .gdoc, .gsheet or .gslides"
    )]
    UnsupportedType { path: String, extension: String },

    #[error(
        "Could not find document in Google Drive: {path} ({candidates} document(s) with that name, none in the expected folder)"
    )]
    NotFound { path: String, candidates: usize },

    #[error("Ambiguous path {path}: {} documents match ({})", ids.len(), ids.join(", "))]
    Ambiguous { path: String, ids: Vec<String> },

    #[error("Could not resolve the folder chain of document {document_id}: {reason}")]
    Resolution { document_id: String, reason: String },

    #[error("{operation} failed for {target}: {source}")]
    Fetch {
        operation: &'static str,
        target: String,
        #[source]
        source: ClientError,
    },

    #[error("Malformed content in document {document_id}: {reason}")]
    MalformedContent { document_id: String, reason: String },

    #[error("{reason} ({path})")]
    Validation { path: String, reason: String },
}

impl DriveError {
    /// Stable machine-readable error kind for the tool boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            DriveError::UnsupportedType { .. } => "unsupported_type",
            DriveError::NotFound { .. } => "not_found",
            DriveError::Ambiguous { .. } => "ambiguous",
            DriveError::Resolution { .. } => "resolution",
            DriveError::Fetch { .. } => "fetch",
            DriveError::MalformedContent { .. } => "malformed_content",
            DriveError::Validation { .. } => "validation",
        }
    }

    pub fn format_mismatch(path: &str, format: ExportFormat, doc_type: DocType) -> Self {
        DriveError::Validation {
            path: path.to_string(),
            reason: format!("Format '{}' is not supported for {} documents", format, doc_type),
        }
    }

    pub fn type_mismatch(path: &str, expected: DocType, actual: DocType) -> Self {
        DriveError::Validation {
            path: path.to_string(),
            reason: format!(
                "File must be a .{} file, got a {}",
                expected.extension(),
                actual
            ),
        }
    }
}
