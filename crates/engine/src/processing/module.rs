//! Module processing: loaded exports to a normalized module record.

use std::num::NonZeroUsize;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use storydex_domain::merge::normalize_arg_types;
use storydex_domain::{
    sanitize, story_name_from_export, to_id, ComponentAnnotations, DomainError, EntryId,
    ModuleExports, StoryAnnotations, StoryObject,
};

use crate::error::StoreError;
use crate::infrastructure::cache::{ByAddress, MemoCache};

/// Normalized result of interpreting one module's exports.
#[derive(Debug)]
pub struct ModuleRecord {
    pub import_path: String,
    /// Component annotations with id, title and `fileName` filled in.
    pub meta: Arc<ComponentAnnotations>,
    /// Story annotations by story id, in export order.
    pub stories: IndexMap<EntryId, Arc<StoryAnnotations>>,
    pub exports: Arc<ModuleExports>,
}

impl ModuleRecord {
    pub fn story(&self, id: &str) -> Option<&Arc<StoryAnnotations>> {
        self.stories.get(id)
    }
}

/// Interpret a module's exports.
///
/// `title` comes from the index entry and overrides whatever the module
/// declares.
pub fn process_module(
    exports: &Arc<ModuleExports>,
    import_path: &str,
    title: &str,
) -> Result<ModuleRecord, StoreError> {
    let default = exports
        .default
        .as_ref()
        .ok_or_else(|| StoreError::MissingComponentAnnotations {
            import_path: import_path.to_string(),
        })?;
    let meta = normalize_component(default, title, import_path)?;

    let mut stories: IndexMap<EntryId, Arc<StoryAnnotations>> = IndexMap::new();
    for (export_name, export) in exports.ordered_exports() {
        if !meta.is_story_export(export_name) {
            continue;
        }
        let object = export
            .to_story_object()
            .map_err(|e| StoreError::InvalidStoryExport {
                import_path: import_path.to_string(),
                export_name: export_name.to_string(),
                reason: e.to_string(),
            })?;
        let story = normalize_story(export_name, object, &meta)?;
        if stories.contains_key(&story.id) {
            tracing::warn!(
                story_id = %story.id,
                import_path,
                "Duplicate story id in module, later export wins"
            );
        }
        stories.insert(story.id.clone(), Arc::new(story));
    }

    if stories.is_empty() {
        tracing::debug!(import_path, "Module declares no stories");
    }

    Ok(ModuleRecord {
        import_path: import_path.to_string(),
        meta: Arc::new(meta),
        stories,
        exports: Arc::clone(exports),
    })
}

fn normalize_component(
    default: &ComponentAnnotations,
    title: &str,
    import_path: &str,
) -> Result<ComponentAnnotations, StoreError> {
    let raw_id = default.id.as_deref().unwrap_or(title);
    let id = sanitize(raw_id);
    if id.is_empty() {
        return Err(DomainError::InvalidIdPart(raw_id.to_string()).into());
    }

    let mut meta = default.clone();
    meta.id = Some(id);
    meta.title = Some(title.to_string());
    meta.arg_types = normalize_arg_types(&default.arg_types);
    meta.parameters
        .entry("fileName")
        .or_insert_with(|| Value::String(import_path.to_string()));
    Ok(meta)
}

fn normalize_story(
    export_name: &str,
    object: StoryObject,
    meta: &ComponentAnnotations,
) -> Result<StoryAnnotations, StoreError> {
    let exported_name = story_name_from_export(export_name);
    let component_id = meta.id.as_deref().unwrap_or_default();
    let id = to_id(component_id, &exported_name)?;
    let name = object.name.or(object.story_name).unwrap_or(exported_name);

    let mut parameters = object.parameters;
    parameters.insert("__id".into(), Value::String(id.to_string()));

    Ok(StoryAnnotations {
        id,
        name,
        export_name: export_name.to_string(),
        args: object.args,
        arg_types: normalize_arg_types(&object.arg_types),
        parameters,
        tags: object.tags,
        decorators: object.decorators,
        loaders: object.loaders,
        render: object.render,
    })
}

type ModuleKey = (ByAddress<ModuleExports>, String, String);

/// Memoized `process_module`, keyed by (exports identity, import path,
/// title).
pub struct ModuleCache {
    inner: MemoCache<ModuleKey, Arc<ModuleRecord>>,
}

impl ModuleCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: MemoCache::new("module", capacity),
        }
    }

    pub fn process(
        &self,
        exports: &Arc<ModuleExports>,
        import_path: &str,
        title: &str,
    ) -> Result<Arc<ModuleRecord>, StoreError> {
        let key = (
            ByAddress::new(exports),
            import_path.to_string(),
            title.to_string(),
        );
        self.inner.get_or_try_insert_with(key, || {
            process_module(exports, import_path, title).map(Arc::new)
        })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
