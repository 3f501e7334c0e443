use std::time::Duration;

/// What to do when several candidates sit in identical folder chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieBreak {
    /// Take the first match in search order (oldest file first).
    FirstResult,
    /// Refuse to pick and report an ambiguity error.
    Reject,
}

#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Path segments that mark the top of the Drive namespace, compared case-insensitively.
    pub root_labels: Vec<String>,
    /// Root labels followed by the drive's own name, as in `Shared drives\Team\...`.
    /// The drive's root folder is then part of the folder chain.
    pub named_root_labels: Vec<String>,
    pub max_folder_depth: usize,
    pub call_timeout: Duration,
    pub tie_break: TieBreak,
    pub cache_enabled: bool,
}

pub const DEFAULT_MAX_FOLDER_DEPTH: usize = 64;
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            root_labels: vec!["My Drive".to_string()],
            named_root_labels: vec!["Shared drives".to_string(), "Computers".to_string()],
            max_folder_depth: DEFAULT_MAX_FOLDER_DEPTH,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
            tie_break: TieBreak::FirstResult,
            cache_enabled: false,
        }
    }
}

impl DriveConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(labels) = lookup("DRIVE_ROOT_LABELS").and_then(|raw| label_list(&raw)) {
            config.root_labels = labels;
        }

        if let Some(raw) = lookup("DRIVE_NAMED_ROOT_LABELS") {
            config.named_root_labels = label_list(&raw).unwrap_or_default();
        }

        if let Some(raw) = lookup("DRIVE_MAX_FOLDER_DEPTH") {
            match raw.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_folder_depth = depth,
                _ => tracing::warn!(
                    "Ignoring invalid DRIVE_MAX_FOLDER_DEPTH '{}', using {}",
                    raw,
                    DEFAULT_MAX_FOLDER_DEPTH
                ),
            }
        }

        if let Some(raw) = lookup("DRIVE_CALL_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.call_timeout = Duration::from_secs(secs),
                _ => tracing::warn!(
                    "Ignoring invalid DRIVE_CALL_TIMEOUT_SECS '{}', using {}",
                    raw,
                    DEFAULT_CALL_TIMEOUT_SECS
                ),
            }
        }

        if let Some(raw) = lookup("DRIVE_TIE_BREAK") {
            match raw.trim().to_ascii_lowercase().as_str() {
                "first" => config.tie_break = TieBreak::FirstResult,
                "reject" => config.tie_break = TieBreak::Reject,
                other => tracing::warn!("Ignoring unknown DRIVE_TIE_BREAK '{}'", other),
            }
        }

        if let Some(raw) = lookup("DRIVE_RESOLUTION_CACHE") {
            config.cache_enabled = matches!(
                raw.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }

        config
    }
}

/// Comma-separated labels, or `None` when the list is blank.
fn label_list(raw: &str) -> Option<Vec<String>> {
    let labels: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    (!labels.is_empty()).then_some(labels)
}
