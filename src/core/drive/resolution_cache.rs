use dashmap::DashMap;

use super::drive_models::ResolvedDocument;

/// Process-wide map from normalized path to resolved document.
///
/// Entries are written on first successful resolution and only removed by
/// [`ResolutionCache::invalidate`]. Two concurrent resolutions of the same path
/// both insert the same value; the shard lock keeps each entry whole.
pub struct ResolutionCache {
    entries: DashMap<String, ResolvedDocument>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<ResolvedDocument> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, key: String, document: ResolvedDocument) {
        self.entries.insert(key, document);
    }

    /// Drops every entry that points at `document_id`.
    pub fn invalidate(&self, document_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, doc| doc.id != document_id);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}
