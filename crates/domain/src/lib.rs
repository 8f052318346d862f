//! Storydex Domain - pure types shared by the story store.
//!
//! Nothing in this crate performs I/O or suspends; loading, caching and
//! per-story state live in `storydex-engine`.

pub mod annotations;
pub mod error;
pub mod ids;
pub mod index;
pub mod merge;
pub mod story;

pub use annotations::{
    ArgsMap, ComponentAnnotations, Decorator, ExportFilter, Loader, ModuleExport, ModuleExports,
    ProjectAnnotations, Render, StoryAnnotations, StoryObject,
};
pub use error::DomainError;
pub use ids::{sanitize, story_name_from_export, to_id, EntryId};
pub use index::{EntryKind, IndexEntry, StoryIndex};
pub use story::{HooksContext, PreparedStory, StoryContext};
