//! Pure processing stages behind the two identity caches.
//!
//! - `module` - Module exports to a normalized `ModuleRecord`
//! - `prepare` - Story, component and project layers to a `PreparedStory`

pub mod module;
pub mod prepare;

pub use module::{process_module, ModuleCache, ModuleRecord};
pub use prepare::{normalize_project, prepare_story, StoryCache};
