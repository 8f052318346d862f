//! Read-only view over the story index.

use indexmap::{IndexMap, IndexSet};
use storydex_domain::{EntryId, IndexEntry, StoryIndex};

use crate::error::StoreError;

/// Resolves entry ids and import paths against one index snapshot.
///
/// The store never mutates a view; updating the index swaps in a new one.
#[derive(Debug, Clone)]
pub struct StoryIndexStore {
    entries: IndexMap<EntryId, IndexEntry>,
}

impl StoryIndexStore {
    pub fn new(index: StoryIndex) -> Self {
        Self {
            entries: index.entries,
        }
    }

    pub fn entries(&self) -> &IndexMap<EntryId, IndexEntry> {
        &self.entries
    }

    pub fn entry_for(&self, id: &str) -> Result<&IndexEntry, StoreError> {
        self.entries
            .get(id)
            .ok_or_else(|| StoreError::not_found("Entry", id))
    }

    /// First entry (in index order) served by `import_path`.
    pub fn entry_for_import_path(&self, import_path: &str) -> Result<&IndexEntry, StoreError> {
        self.entries
            .values()
            .find(|entry| entry.import_path == import_path)
            .ok_or_else(|| StoreError::not_found("Import path", import_path))
    }

    /// Distinct import paths of story entries, in the order they first
    /// appear. Docs-only modules are not story modules and are left out.
    pub fn story_import_paths(&self) -> Vec<&str> {
        self.entries
            .values()
            .filter(|e| e.is_story())
            .map(|e| e.import_path.as_str())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
