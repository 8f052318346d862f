//! In-memory state storage modules.
//!
//! Stores hold state that is read and written at render time, separately
//! from the preparation caches:
//! - `StoryIndexStore` - Entry id and import path resolution
//! - `ArgsStore` - Current and initial args per story
//! - `GlobalsStore` - Globals shared by all stories
//! - `HooksStore` - Hook contexts per story

pub mod args;
pub mod globals;
pub mod hooks;
pub mod index;

// Re-export store types
pub use args::ArgsStore;
pub use globals::GlobalsStore;
pub use hooks::HooksStore;
pub use index::StoryIndexStore;
