//! Splits a virtual-drive path such as `G:\My Drive\Projects\Plan.gdoc` into
//! the pieces the locator needs: base name, folder chain and document type.
//!
//! Parsing never fails. Anything odd about the input is recorded as a
//! [`ParseWarning`] on the result and the best-effort interpretation is kept.

use super::drive_config::DriveConfig;
use super::drive_errors::ParseWarning;
use super::drive_models::{DocType, ParsedPath};

pub struct PathParser {
    root_labels: Vec<String>,
    named_root_labels: Vec<String>,
}

impl PathParser {
    pub fn new(root_labels: Vec<String>) -> Self {
        Self {
            root_labels: lowercase(&root_labels),
            named_root_labels: Vec::new(),
        }
    }

    /// Adds root labels whose next segment names the drive itself.
    pub fn with_named_roots(mut self, labels: Vec<String>) -> Self {
        self.named_root_labels = lowercase(&labels);
        self
    }

    pub fn parse(&self, raw: &str) -> ParsedPath {
        let normalized = raw.trim().replace('\\', "/");
        let mut segments: Vec<&str> = normalized
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();

        if segments.first().is_some_and(|s| is_drive_letter(s)) {
            segments.remove(0);
        }

        let mut warnings = Vec::new();

        let file_name = match segments.pop() {
            Some(name) => name,
            None => {
                warnings.push(ParseWarning::EmptyPath);
                return ParsedPath {
                    raw: raw.to_string(),
                    base_name: String::new(),
                    folder_segments: Vec::new(),
                    named_root: false,
                    doc_type: None,
                    extension: String::new(),
                    warnings,
                };
            }
        };

        let (base_name, extension) = match file_name.rfind('.') {
            Some(idx) => (&file_name[..idx], &file_name[idx + 1..]),
            None => {
                warnings.push(ParseWarning::MissingExtension);
                (file_name, "")
            }
        };

        let root = segments.iter().enumerate().find_map(|(pos, s)| {
            let label = s.to_lowercase();
            if self.named_root_labels.contains(&label) {
                Some((pos, true))
            } else if self.root_labels.contains(&label) {
                Some((pos, false))
            } else {
                None
            }
        });

        let (folder_segments, named_root): (Vec<String>, bool) = match root {
            Some((pos, named)) => (
                segments[pos + 1..].iter().map(|s| s.to_string()).collect(),
                named,
            ),
            None => {
                warnings.push(ParseWarning::RootMarkerMissing);
                (segments.iter().map(|s| s.to_string()).collect(), false)
            }
        };

        ParsedPath {
            raw: raw.to_string(),
            base_name: base_name.to_string(),
            folder_segments,
            named_root,
            doc_type: DocType::from_extension(extension),
            extension: extension.to_string(),
            warnings,
        }
    }
}

impl Default for PathParser {
    fn default() -> Self {
        let config = DriveConfig::default();
        Self::new(config.root_labels).with_named_roots(config.named_root_labels)
    }
}

fn lowercase(labels: &[String]) -> Vec<String> {
    labels.iter().map(|l| l.to_lowercase()).collect()
}

/// `C:`-style prefix left over from a Windows mount point.
fn is_drive_letter(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
