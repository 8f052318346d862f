//! Story store: loads modules through the loader port and turns them into
//! prepared stories.
//!
//! The store moves from uninitialized to ready exactly once, when an index
//! and a loader are supplied. Operations that only make sense once ready
//! either wait on the readiness gate (`load_entry`, `cache_all_modules`,
//! `on_index_or_loader_changed`) or fail with `StoreError::NotInitialized`
//! (everything else that needs the index or loader).
//!
//! Module loading is the only suspension point. All locks are released
//! before awaiting.

use std::num::NonZeroUsize;
use std::sync::Arc;

use futures_util::future::{join, join_all};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use storydex_domain::{
    ArgsMap, ComponentAnnotations, EntryId, IndexEntry, ModuleExports, PreparedStory,
    ProjectAnnotations, StoryAnnotations, StoryContext, StoryIndex,
};

use crate::error::StoreError;
use crate::infrastructure::ports::ModuleLoader;
use crate::infrastructure::ready_gate::ReadyGate;
use crate::infrastructure::settings::StoreSettings;
use crate::processing::{normalize_project, ModuleCache, ModuleRecord, StoryCache};
use crate::stores::{ArgsStore, GlobalsStore, HooksStore, StoryIndexStore};

/// Module records by import path, in index order.
pub type ModuleRecords = IndexMap<String, Arc<ModuleRecord>>;

/// Per-path outcome of a full load. One failed module does not affect the
/// others.
pub type ModuleLoadResults = IndexMap<String, Result<Arc<ModuleRecord>, StoreError>>;

/// An entry's own module exports plus the records of the story modules it
/// references.
#[derive(Debug, Clone)]
pub struct LoadedEntry {
    pub entry: IndexEntry,
    pub exports: Arc<ModuleExports>,
    pub dependencies: Vec<Arc<ModuleRecord>>,
}

/// A prepared story bound to its render context.
#[derive(Debug, Clone)]
pub struct BoundStory {
    pub story: Arc<PreparedStory>,
    pub context: StoryContext,
}

impl BoundStory {
    /// Render through the decorator chain.
    pub fn render(&self) -> Value {
        self.story.render(&self.context)
    }

    /// Run the story's loaders and merge their results into the context.
    pub async fn load(&mut self) -> &ArgsMap {
        let loaded = self.story.run_loaders(&self.context).await;
        self.context.loaded.extend(loaded);
        &self.context.loaded
    }
}

pub struct StoryStore {
    index: RwLock<Option<Arc<StoryIndexStore>>>,
    loader: RwLock<Option<Arc<dyn ModuleLoader>>>,
    project: RwLock<Arc<ProjectAnnotations>>,
    module_cache: ModuleCache,
    story_cache: StoryCache,
    args: ArgsStore,
    globals: GlobalsStore,
    hooks: HooksStore,
    /// Every story module, materialized by `cache_all_modules`.
    cached_modules: RwLock<Option<Arc<ModuleRecords>>>,
    ready: ReadyGate,
    settings: StoreSettings,
}

impl StoryStore {
    pub fn new(project: ProjectAnnotations, settings: StoreSettings) -> Self {
        let project = normalize_project(project);
        let globals = GlobalsStore::new(&project.globals, &project.global_types);
        Self {
            index: RwLock::new(None),
            loader: RwLock::new(None),
            project: RwLock::new(Arc::new(project)),
            module_cache: ModuleCache::new(settings.module_cache_capacity),
            story_cache: StoryCache::new(settings.story_cache_capacity),
            args: ArgsStore::new(),
            globals,
            hooks: HooksStore::new(),
            cached_modules: RwLock::new(None),
            ready: ReadyGate::new(),
            settings,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Supply the index and loader, moving the store to ready. Tasks waiting
    /// on readiness resume.
    pub fn initialize(
        &self,
        index: StoryIndex,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<(), StoreError> {
        let entries = index.entries.len();
        {
            let mut index_slot = self.index.write();
            if index_slot.is_some() {
                return Err(StoreError::AlreadyInitialized);
            }
            *self.loader.write() = Some(loader);
            *index_slot = Some(Arc::new(StoryIndexStore::new(index)));
        }
        self.ready.open();
        tracing::info!(entries, "Story store initialized");
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_open()
    }

    /// Wait until the store is initialized.
    pub async fn ready(&self) {
        self.ready.wait().await;
    }

    /// Replace project annotations wholesale.
    ///
    /// Prepared stories derived from the previous annotations are no longer
    /// reachable from the story cache. Globals are re-seeded, keeping user
    /// changes to names that are still declared.
    pub fn set_project_annotations(&self, project: ProjectAnnotations) {
        let project = normalize_project(project);
        self.globals.set(&project.globals, &project.global_types);
        *self.project.write() = Arc::new(project);
        tracing::info!("Project annotations replaced");
    }

    pub fn project_annotations(&self) -> Arc<ProjectAnnotations> {
        Arc::clone(&self.project.read())
    }

    /// Swap the loader and/or the index once the store is ready.
    ///
    /// Caches are left as they are. If every module had been materialized
    /// before, the materialization is redone against the new index and loader.
    pub async fn on_index_or_loader_changed(
        &self,
        loader: Option<Arc<dyn ModuleLoader>>,
        index: Option<StoryIndex>,
    ) -> Result<(), StoreError> {
        self.ready.wait().await;

        if let Some(loader) = loader {
            *self.loader.write() = Some(loader);
            tracing::debug!("Module loader replaced");
        }
        if let Some(index) = index {
            let entries = index.entries.len();
            *self.index.write() = Some(Arc::new(StoryIndexStore::new(index)));
            tracing::debug!(entries, "Story index replaced");
        }

        let had_snapshot = self.cached_modules.read().is_some();
        if had_snapshot {
            self.cache_all_modules().await?;
        }
        Ok(())
    }

    // =========================================================================
    // Index access
    // =========================================================================

    fn services(&self) -> Result<(Arc<StoryIndexStore>, Arc<dyn ModuleLoader>), StoreError> {
        let index = self.index.read().clone().ok_or(StoreError::NotInitialized)?;
        let loader = self.loader.read().clone().ok_or(StoreError::NotInitialized)?;
        Ok((index, loader))
    }

    pub fn index(&self) -> Result<Arc<StoryIndexStore>, StoreError> {
        self.index.read().clone().ok_or(StoreError::NotInitialized)
    }

    pub fn entry_for(&self, id: &str) -> Result<IndexEntry, StoreError> {
        self.index()?.entry_for(id).cloned()
    }

    // =========================================================================
    // Module loading
    // =========================================================================

    async fn import(
        loader: &Arc<dyn ModuleLoader>,
        import_path: &str,
    ) -> Result<Arc<ModuleExports>, StoreError> {
        tracing::debug!(import_path, "Importing module");
        loader
            .import(import_path)
            .await
            .map_err(|e| StoreError::loader(import_path, e))
    }

    /// Load and process the module at `import_path`, titled by the first
    /// index entry it serves.
    async fn load_module_at(
        &self,
        index: &StoryIndexStore,
        loader: &Arc<dyn ModuleLoader>,
        import_path: &str,
    ) -> Result<Arc<ModuleRecord>, StoreError> {
        let title = index.entry_for_import_path(import_path)?.title.clone();
        let exports = Self::import(loader, import_path).await?;
        self.module_cache.process(&exports, import_path, &title)
    }

    /// Load the module serving entry `id`.
    pub async fn load_module_for_entry(&self, id: &str) -> Result<Arc<ModuleRecord>, StoreError> {
        let (index, loader) = self.services()?;
        let entry = index.entry_for(id)?;
        let exports = Self::import(&loader, &entry.import_path).await?;
        self.module_cache
            .process(&exports, &entry.import_path, &entry.title)
    }

    /// Load every story module using the configured batch size.
    pub async fn load_all_modules(&self) -> Result<ModuleLoadResults, StoreError> {
        self.load_all_modules_batched(self.settings.batch_size).await
    }

    /// Load every story module, `batch_size` at a time.
    ///
    /// Loads inside a batch run concurrently; a batch starts only after every
    /// load of the previous batch has settled. Results keep index order.
    pub async fn load_all_modules_batched(
        &self,
        batch_size: NonZeroUsize,
    ) -> Result<ModuleLoadResults, StoreError> {
        let (index, loader) = self.services()?;
        let paths: Vec<String> = index
            .story_import_paths()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut results = ModuleLoadResults::with_capacity(paths.len());
        for (batch_number, batch) in paths.chunks(batch_size.get()).enumerate() {
            tracing::debug!(batch = batch_number, modules = batch.len(), "Loading module batch");
            let loaded = join_all(
                batch
                    .iter()
                    .map(|path| self.load_module_at(&index, &loader, path)),
            )
            .await;

            for (path, result) in batch.iter().zip(loaded) {
                if let Err(e) = &result {
                    tracing::warn!(import_path = %path, error = %e, "Module failed to load");
                }
                results.insert(path.clone(), result);
            }
        }
        Ok(results)
    }

    /// Load and keep every story module, enabling extraction.
    ///
    /// If any module fails the first error is returned and the previous
    /// materialization, if any, is kept.
    pub async fn cache_all_modules(&self) -> Result<(), StoreError> {
        self.ready.wait().await;

        let results = self.load_all_modules().await?;
        let mut records = ModuleRecords::with_capacity(results.len());
        for (path, result) in results {
            records.insert(path, result?);
        }

        let modules = records.len();
        *self.cached_modules.write() = Some(Arc::new(records));
        tracing::info!(modules, "All modules cached");
        Ok(())
    }

    pub fn cached_modules(&self) -> Option<Arc<ModuleRecords>> {
        self.cached_modules.read().clone()
    }

    /// Load an entry's own exports together with the story modules it
    /// references, waiting for readiness first.
    ///
    /// Every load runs to completion; the first failure is then returned.
    pub async fn load_entry(&self, id: &str) -> Result<LoadedEntry, StoreError> {
        self.ready.wait().await;

        let (index, loader) = self.services()?;
        let entry = index.entry_for(id)?.clone();
        let dependency_loads = entry
            .stories_imports
            .iter()
            .map(|path| self.load_module_at(&index, &loader, path));

        let (exports, dependencies) = join(
            Self::import(&loader, &entry.import_path),
            join_all(dependency_loads),
        )
        .await;

        let dependencies = dependencies.into_iter().collect::<Result<Vec<_>, _>>()?;
        Ok(LoadedEntry {
            entry,
            exports: exports?,
            dependencies,
        })
    }

    // =========================================================================
    // Processing and preparation
    // =========================================================================

    pub fn process_module(
        &self,
        exports: &Arc<ModuleExports>,
        import_path: &str,
        title: &str,
    ) -> Result<Arc<ModuleRecord>, StoreError> {
        self.module_cache.process(exports, import_path, title)
    }

    /// Prepare a story against the current project annotations.
    pub fn prepare_story(
        &self,
        story: &Arc<StoryAnnotations>,
        component: &Arc<ComponentAnnotations>,
    ) -> Result<Arc<PreparedStory>, StoreError> {
        let project = self.project_annotations();
        self.story_cache.prepare(story, component, &project)
    }

    /// Prepare story `id` from a module record and seed its args and hooks.
    pub fn story_from_module(
        &self,
        record: &ModuleRecord,
        id: &str,
    ) -> Result<Arc<PreparedStory>, StoreError> {
        let story = record
            .story(id)
            .ok_or_else(|| StoreError::MissingStoryInModule {
                story_id: EntryId::from(id),
                import_path: record.import_path.clone(),
            })?;
        let prepared = self.prepare_story(story, &record.meta)?;
        self.args.set_initial(&prepared);
        self.hooks.get_or_create(&prepared.id);
        Ok(prepared)
    }

    /// Load and prepare story `id`.
    pub async fn load_story(&self, id: &str) -> Result<Arc<PreparedStory>, StoreError> {
        let record = self.load_module_for_entry(id).await?;
        self.story_from_module(&record, id)
    }

    /// Prepare every story of a module that the index lists, in index order.
    pub fn component_stories_from_module(
        &self,
        record: &ModuleRecord,
    ) -> Result<Vec<Arc<PreparedStory>>, StoreError> {
        let index = self.index()?;
        index
            .entries()
            .keys()
            .filter(|id| record.stories.contains_key(*id))
            .map(|id| self.story_from_module(record, id.as_str()))
            .collect()
    }

    // =========================================================================
    // Render-time state
    // =========================================================================

    /// Build the context a renderer sees, with current args or, when
    /// `force_initial_args` is set, the story's initial args.
    pub fn story_context(
        &self,
        story: &PreparedStory,
        force_initial_args: bool,
    ) -> Result<StoryContext, StoreError> {
        let args = if force_initial_args {
            story.initial_args.clone()
        } else {
            self.args.get(story.id.as_str())?
        };
        let hooks = self.hooks.get_or_create(&story.id);
        Ok(StoryContext::new(story, args, self.globals.get(), hooks))
    }

    pub fn bind(
        &self,
        story: Arc<PreparedStory>,
        force_initial_args: bool,
    ) -> Result<BoundStory, StoreError> {
        let context = self.story_context(&story, force_initial_args)?;
        Ok(BoundStory { story, context })
    }

    pub fn add_cleanup_callbacks<F>(&self, id: &EntryId, callbacks: impl IntoIterator<Item = F>)
    where
        F: FnOnce() + Send + 'static,
    {
        let hooks = self.hooks.get_or_create(id);
        for callback in callbacks {
            hooks.add_cleanup(callback);
        }
    }

    /// Run and drop a story's cleanup callbacks.
    pub fn cleanup_story(&self, id: &str) -> usize {
        let ran = self.hooks.cleanup(id);
        tracing::debug!(story_id = id, callbacks = ran, "Story cleaned up");
        ran
    }

    pub fn args(&self) -> &ArgsStore {
        &self.args
    }

    pub fn globals(&self) -> &GlobalsStore {
        &self.globals
    }
}
