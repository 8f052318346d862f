//! Serializable snapshots of every prepared story.
//!
//! All views require `StoryStore::cache_all_modules` to have completed and
//! fail with `StoreError::CacheNotReady` otherwise.

use indexmap::IndexMap;
use serde::Serialize;
use storydex_domain::{ArgsMap, EntryId, IndexEntry};

use crate::error::StoreError;
use crate::store::StoryStore;

/// Parameters kept by the v3 stories payload.
const LEGACY_PARAMETERS: [&str; 5] = ["fileName", "docsOnly", "framework", "__id", "__isArgsStory"];

/// A prepared story without its functions. Sequences are sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedStory {
    pub id: EntryId,
    pub name: String,
    pub title: String,
    pub component_id: String,
    pub export_name: String,
    pub tags: Vec<String>,
    pub parameters: ArgsMap,
    pub arg_types: ArgsMap,
    pub initial_args: ArgsMap,
    /// Same as `initial_args`.
    pub args: ArgsMap,
    /// Initial globals.
    pub globals: ArgsMap,
}

/// One story in the v3 payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStory {
    pub id: EntryId,
    pub name: String,
    pub title: String,
    pub import_path: String,
    /// The title, under its old name.
    pub kind: String,
    /// The name, under its old name.
    pub story: String,
    pub parameters: ArgsMap,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyStoriesPayload {
    pub v: u32,
    pub stories: IndexMap<EntryId, LegacyStory>,
}

/// An index entry, plus resolved args and parameters for stories.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPayloadEntry {
    #[serde(flatten)]
    pub entry: IndexEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<ArgsMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_args: Option<ArgsMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg_types: Option<ArgsMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<ArgsMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexPayload {
    pub v: u32,
    pub entries: IndexMap<EntryId, IndexPayloadEntry>,
}

impl StoryStore {
    /// Snapshot every story entry of the index, in index order.
    ///
    /// Docs-only stories are left out unless `include_docs_only` is set.
    pub fn extract(
        &self,
        include_docs_only: bool,
    ) -> Result<IndexMap<EntryId, ExtractedStory>, StoreError> {
        let modules = self.cached_modules().ok_or(StoreError::CacheNotReady)?;
        let index = self.index()?;
        let globals = self.globals().initial();

        let mut extracted = IndexMap::new();
        for entry in index.entries().values().filter(|e| e.is_story()) {
            let record = modules
                .get(&entry.import_path)
                .ok_or_else(|| StoreError::not_found("Cached module", &entry.import_path))?;
            let story = self.story_from_module(record, entry.id.as_str())?;
            if story.is_docs_only() && !include_docs_only {
                continue;
            }

            let mut tags = story.tags.clone();
            tags.sort();
            extracted.insert(
                story.id.clone(),
                ExtractedStory {
                    id: story.id.clone(),
                    name: story.name.clone(),
                    title: story.title.clone(),
                    component_id: story.component_id.clone(),
                    export_name: story.export_name.clone(),
                    tags,
                    parameters: story.parameters.clone(),
                    arg_types: story.arg_types.clone(),
                    initial_args: story.initial_args.clone(),
                    args: story.initial_args.clone(),
                    globals: globals.clone(),
                },
            );
        }
        tracing::debug!(stories = extracted.len(), include_docs_only, "Extracted stories");
        Ok(extracted)
    }

    /// The v3 `stories.json` shape, docs-only stories included.
    pub fn stories_json_data(&self) -> Result<LegacyStoriesPayload, StoreError> {
        let index = self.index()?;
        let stories: IndexMap<EntryId, LegacyStory> = self
            .extract(true)?
            .into_iter()
            .map(|(id, story)| {
                let import_path = index.entry_for(id.as_str())?.import_path.clone();
                let mut parameters: ArgsMap = story
                    .parameters
                    .into_iter()
                    .filter(|(key, _)| LEGACY_PARAMETERS.contains(&key.as_str()))
                    .collect();
                parameters.insert("fileName".into(), import_path.clone().into());

                let legacy = LegacyStory {
                    id: story.id,
                    kind: story.title.clone(),
                    story: story.name.clone(),
                    name: story.name,
                    title: story.title,
                    import_path,
                    parameters,
                };
                Ok::<_, StoreError>((id, legacy))
            })
            .collect::<Result<_, _>>()?;
        Ok(LegacyStoriesPayload { v: 3, stories })
    }

    /// The v4 index with each extracted story's args and parameters merged
    /// into its entry.
    pub fn index_payload(&self) -> Result<IndexPayload, StoreError> {
        let index = self.index()?;
        let mut stories = self.extract(true)?;

        let entries = index
            .entries()
            .iter()
            .map(|(id, entry)| {
                let story = stories.swap_remove(id);
                let payload = IndexPayloadEntry {
                    entry: entry.clone(),
                    args: story.as_ref().map(|s| s.initial_args.clone()),
                    initial_args: story.as_ref().map(|s| s.initial_args.clone()),
                    arg_types: story.as_ref().map(|s| s.arg_types.clone()),
                    parameters: story.map(|s| s.parameters),
                };
                (id.clone(), payload)
            })
            .collect();
        Ok(IndexPayload { v: 4, entries })
    }
}
