//! Index data model.
//!
//! The index is supplied wholesale by an external indexer and is the only
//! source of truth for which import path serves which entry.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ids::EntryId;

/// Kind of an index entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Story,
    Docs,
}

/// One addressable index item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: EntryId,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub import_path: String,
    pub title: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Story-bearing modules a docs entry references.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stories_imports: Vec<String>,
}

impl IndexEntry {
    pub fn story(
        id: impl Into<EntryId>,
        title: impl Into<String>,
        name: impl Into<String>,
        import_path: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: EntryKind::Story,
            import_path: import_path.into(),
            title: title.into(),
            name: name.into(),
            tags: Vec::new(),
            stories_imports: Vec::new(),
        }
    }

    pub fn docs(
        id: impl Into<EntryId>,
        title: impl Into<String>,
        import_path: impl Into<String>,
        stories_imports: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: EntryKind::Docs,
            import_path: import_path.into(),
            title: title.into(),
            name: "Docs".to_string(),
            tags: Vec::new(),
            stories_imports,
        }
    }

    pub fn is_story(&self) -> bool {
        self.kind == EntryKind::Story
    }
}

/// Full index as produced by the indexer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoryIndex {
    #[serde(default = "default_index_version")]
    pub v: u32,
    pub entries: IndexMap<EntryId, IndexEntry>,
}

fn default_index_version() -> u32 {
    4
}

impl StoryIndex {
    pub fn new(entries: impl IntoIterator<Item = IndexEntry>) -> Self {
        Self {
            v: default_index_version(),
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }
}
