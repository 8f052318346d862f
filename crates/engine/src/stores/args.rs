//! Current and initial args per story.
//!
//! Args are seeded from a prepared story the first time it is prepared and
//! then evolve independently of the preparation cache.

use dashmap::DashMap;
use storydex_domain::merge::{args_delta, combine_args};
use storydex_domain::{ArgsMap, EntryId, PreparedStory};

use crate::error::StoreError;

#[derive(Debug, Clone)]
struct ArgsRecord {
    initial: ArgsMap,
    current: ArgsMap,
}

/// Keyed store of args. No eviction: records live until `clear`.
#[derive(Debug, Default)]
pub struct ArgsStore {
    records: DashMap<EntryId, ArgsRecord>,
}

impl ArgsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current args of a story.
    pub fn get(&self, id: &str) -> Result<ArgsMap, StoreError> {
        self.records
            .get(id)
            .map(|record| record.current.clone())
            .ok_or_else(|| StoreError::not_found("Args", id))
    }

    pub fn initial(&self, id: &str) -> Result<ArgsMap, StoreError> {
        self.records
            .get(id)
            .map(|record| record.initial.clone())
            .ok_or_else(|| StoreError::not_found("Args", id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Seed args from a prepared story.
    ///
    /// A story seen for the first time gets its initial args as current
    /// args. Seeding again with the same initial args changes nothing. If the
    /// initial args changed, the caller's edits relative to the old initial
    /// args are re-applied on top of the new ones.
    pub fn set_initial(&self, story: &PreparedStory) {
        self.records
            .entry(story.id.clone())
            .and_modify(|record| {
                if record.initial != story.initial_args {
                    let delta = args_delta(&record.initial, &record.current);
                    tracing::debug!(story_id = %story.id, changed = delta.len(), "Rebasing args on new initial args");
                    record.current = combine_args([&story.initial_args, &delta]);
                    record.initial = story.initial_args.clone();
                }
            })
            .or_insert_with(|| ArgsRecord {
                initial: story.initial_args.clone(),
                current: story.initial_args.clone(),
            });
    }

    /// Merge `update` into the current args. Keys absent from the update are
    /// left alone.
    pub fn update(&self, id: &str, update: &ArgsMap) -> Result<(), StoreError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Args", id))?;
        record
            .current
            .extend(update.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }

    /// Restore args to their initial values: the given keys, or all of
    /// them when `keys` is `None`.
    pub fn reset(&self, id: &str, keys: Option<&[String]>) -> Result<ArgsMap, StoreError> {
        let mut record = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Args", id))?;
        match keys {
            None => record.current = record.initial.clone(),
            Some(keys) => {
                for key in keys {
                    match record.initial.get(key).cloned() {
                        Some(initial) => {
                            record.current.insert(key.clone(), initial);
                        }
                        None => {
                            record.current.remove(key);
                        }
                    }
                }
            }
        }
        Ok(record.current.clone())
    }

    pub fn clear(&self) {
        self.records.clear();
    }
}
