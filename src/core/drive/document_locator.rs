// =============================================================================
// DOCUMENT LOCATOR
// =============================================================================
//
// Maps a parsed virtual-drive path to exactly one Drive file.
//
// Drive only lets us search by name and MIME type, so a name like "Notes"
// can return many files. Each candidate's ancestors are walked upward with
// parent lookups, and the resulting folder chain (root to parent) must equal
// the parsed folder segments exactly. The root folder's name only counts for
// paths under a named root: "My Drive" is the label of the root itself, while
// a shared drive's root folder carries the drive name that follows
// "Shared drives" in the path.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use super::drive_config::{DriveConfig, TieBreak};
use super::drive_errors::{ClientError, DriveError};
use super::drive_models::{DriveCandidate, ParentInfo, ParsedPath, ResolvedDocument};
use super::drive_store::DriveMetadata;
use super::resolution_cache::ResolutionCache;

pub struct DocumentLocator<M: DriveMetadata> {
    metadata: M,
    max_folder_depth: usize,
    call_timeout: Duration,
    tie_break: TieBreak,
    cache: Option<Arc<ResolutionCache>>,
}

impl<M: DriveMetadata> DocumentLocator<M> {
    pub fn new(metadata: M, config: &DriveConfig) -> Self {
        Self {
            metadata,
            max_folder_depth: config.max_folder_depth,
            call_timeout: config.call_timeout,
            tie_break: config.tie_break,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResolutionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn locate(&self, parsed: &ParsedPath) -> Result<ResolvedDocument, DriveError> {
        let doc_type = parsed
            .doc_type
            .ok_or_else(|| DriveError::UnsupportedType {
                path: parsed.raw.clone(),
                extension: parsed.extension.clone(),
            })?;

        let key = parsed.cache_key();
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&key) {
                tracing::debug!("Resolution cache hit for '{}' -> {}", key, hit.id);
                return Ok(hit);
            }
        }

        let mime_type = doc_type.mime_type();
        tracing::info!(
            "Searching for '{}' ({}) in folder '{}'",
            parsed.base_name,
            mime_type,
            parsed.folder_segments.join("/")
        );

        let results = with_timeout(
            self.call_timeout,
            self.metadata.search_documents(&parsed.base_name, mime_type),
        )
        .await
        .map_err(|source| DriveError::Fetch {
            operation: "Drive search",
            target: parsed.raw.clone(),
            source,
        })?;

        // The search service compares names loosely; Drive names are case-preserving.
        let candidates: Vec<DriveCandidate> = results
            .into_iter()
            .filter(|c| c.name == parsed.base_name && c.mime_type == mime_type)
            .collect();

        if candidates.is_empty() {
            tracing::warn!("No documents named '{}' found", parsed.base_name);
            return Err(DriveError::NotFound {
                path: parsed.raw.clone(),
                candidates: 0,
            });
        }

        tracing::info!(
            "Found {} document(s) named '{}', checking folder chains",
            candidates.len(),
            parsed.base_name
        );

        let mut folders: HashMap<String, ParentInfo> = HashMap::new();
        let mut matches: Vec<&DriveCandidate> = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let full_chain = self.folder_chain(candidate, &mut folders).await?;
            let chain = if parsed.named_root {
                &full_chain[..]
            } else {
                full_chain.get(1..).unwrap_or(&[])
            };
            let is_match = chain == parsed.folder_segments.as_slice();
            tracing::debug!(
                "Candidate {}/{} {} in '{}': {}",
                index + 1,
                candidates.len(),
                candidate.id,
                chain.join("/"),
                if is_match { "match" } else { "mismatch" }
            );
            if is_match {
                matches.push(candidate);
            }
        }

        let chosen = match matches.as_slice() {
            [] => {
                tracing::warn!(
                    "None of the {} candidates is in folder '{}'",
                    candidates.len(),
                    parsed.folder_segments.join("/")
                );
                return Err(DriveError::NotFound {
                    path: parsed.raw.clone(),
                    candidates: candidates.len(),
                });
            }
            [only] => *only,
            [first, ..] => match self.tie_break {
                TieBreak::FirstResult => {
                    tracing::warn!(
                        "{} documents match {}; using the first search result {} (others: {})",
                        matches.len(),
                        parsed.raw,
                        first.id,
                        matches[1..]
                            .iter()
                            .map(|c| c.id.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    );
                    *first
                }
                TieBreak::Reject => {
                    return Err(DriveError::Ambiguous {
                        path: parsed.raw.clone(),
                        ids: matches.iter().map(|c| c.id.clone()).collect(),
                    });
                }
            },
        };

        let resolved = ResolvedDocument {
            id: chosen.id.clone(),
            name: chosen.name.clone(),
            doc_type,
        };
        tracing::info!("Resolved {} to document {}", parsed.raw, resolved.id);

        if let Some(cache) = &self.cache {
            cache.insert(key, resolved.clone());
        }

        Ok(resolved)
    }

    /// Folder names from the drive root down to the candidate's parent.
    async fn folder_chain(
        &self,
        candidate: &DriveCandidate,
        folders: &mut HashMap<String, ParentInfo>,
    ) -> Result<Vec<String>, DriveError> {
        let mut chain = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut next = candidate.parent_id.clone();

        while let Some(folder_id) = next {
            if visited.len() >= self.max_folder_depth {
                return Err(DriveError::Resolution {
                    document_id: candidate.id.clone(),
                    reason: format!(
                        "folder chain is deeper than {} levels",
                        self.max_folder_depth
                    ),
                });
            }
            if !visited.insert(folder_id.clone()) {
                return Err(DriveError::Resolution {
                    document_id: candidate.id.clone(),
                    reason: format!("folder {} appears twice in its own ancestry", folder_id),
                });
            }

            let info = match folders.get(&folder_id) {
                Some(info) => info.clone(),
                None => {
                    let info = with_timeout(
                        self.call_timeout,
                        self.metadata.get_parent(&folder_id),
                    )
                    .await
                    .map_err(|source| DriveError::Fetch {
                        operation: "Drive folder lookup",
                        target: format!("folder {} of document {}", folder_id, candidate.id),
                        source,
                    })?;
                    folders.insert(folder_id.clone(), info.clone());
                    info
                }
            };

            // A folder without a parent is the drive root.
            chain.push(info.name);
            next = info.parent_id;
        }

        chain.reverse();
        Ok(chain)
    }
}

pub(crate) async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ClientError>
where
    F: std::future::Future<Output = Result<T, ClientError>>,
{
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout(limit)),
    }
}
