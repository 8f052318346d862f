//! Storydex Engine library.
//!
//! Loads story modules through a pluggable loader, turns them into prepared
//! stories behind two identity caches, and keeps the per-story state a
//! renderer needs.
//!
//! ## Structure
//!
//! - `infrastructure/` - Loader port and adapters, caches, readiness gate, settings
//! - `stores/` - Index, args, globals and hooks stores
//! - `processing/` - Module processing and story preparation
//! - `store` - The `StoryStore` orchestrating loading and preparation
//! - `extract` - Serializable snapshots and compatibility payloads

pub mod error;
pub mod extract;
pub mod infrastructure;
pub mod processing;
pub mod store;
pub mod stores;

/// Builders shared by unit tests.
#[cfg(test)]
mod test_fixtures;

/// End-to-end tests over temporary JSON module directories.
#[cfg(test)]
mod e2e_tests;

pub use error::StoreError;
pub use extract::{ExtractedStory, IndexPayload, LegacyStoriesPayload};
pub use infrastructure::loaders::{JsonDirModuleLoader, StaticModuleLoader};
pub use infrastructure::ports::{LoaderError, ModuleLoader};
pub use infrastructure::settings::StoreSettings;
pub use store::{BoundStory, LoadedEntry, StoryStore};
