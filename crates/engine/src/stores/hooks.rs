//! Hook contexts per story id.

use std::sync::Arc;

use dashmap::DashMap;
use storydex_domain::{EntryId, HooksContext};

/// One `HooksContext` per prepared story, created on first use.
#[derive(Debug, Default)]
pub struct HooksStore {
    contexts: DashMap<EntryId, Arc<HooksContext>>,
}

impl HooksStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create(&self, id: &EntryId) -> Arc<HooksContext> {
        if let Some(existing) = self.contexts.get(id.as_str()) {
            return Arc::clone(existing.value());
        }
        self.contexts
            .entry(id.clone())
            .or_insert_with(|| Arc::new(HooksContext::new()))
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<Arc<HooksContext>> {
        self.contexts.get(id).map(|ctx| Arc::clone(ctx.value()))
    }

    /// Run the cleanup callbacks registered for a story.
    pub fn cleanup(&self, id: &str) -> usize {
        self.get(id).map_or(0, |ctx| ctx.clean())
    }
}
