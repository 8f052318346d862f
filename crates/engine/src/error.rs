//! Store error taxonomy.
//!
//! Every failure surfaces as a discriminated kind so callers can tell "not
//! ready yet" apart from "permanently invalid".

use storydex_domain::{DomainError, EntryId};
use thiserror::Error;

use crate::infrastructure::ports::LoaderError;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store has no index or loader yet.
    #[error("Store is not initialized: call initialize() first")]
    NotInitialized,

    /// `initialize` was called a second time.
    #[error("Store is already initialized")]
    AlreadyInitialized,

    /// Unknown entry id, import path or args record.
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: &'static str, id: String },

    /// The module has no default export describing its component.
    #[error("Module {import_path} has no component annotations (default export)")]
    MissingComponentAnnotations { import_path: String },

    /// A named export that should be a story is neither a function nor a
    /// story object.
    #[error("Export '{export_name}' of {import_path} is not a valid story: {reason}")]
    InvalidStoryExport {
        import_path: String,
        export_name: String,
        reason: String,
    },

    /// The index points at a module that does not define the story.
    #[error("Story {story_id} is not defined by module {import_path}")]
    MissingStoryInModule { story_id: EntryId, import_path: String },

    /// No render implementation at story, component or project level.
    #[error("Cannot prepare story {story_id}: {reason}")]
    Preparation { story_id: EntryId, reason: String },

    /// A snapshot was requested before every module was loaded and cached.
    #[error("Cannot extract before all modules are cached: call cache_all_modules() first")]
    CacheNotReady,

    #[error("Failed to load {import_path}: {source}")]
    Loader {
        import_path: String,
        #[source]
        source: LoaderError,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl StoreError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    pub fn loader(import_path: impl Into<String>, source: LoaderError) -> Self {
        Self::Loader {
            import_path: import_path.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// True for the transient "try again later" kinds.
    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotInitialized | Self::CacheNotReady)
    }
}
