//! End-to-end tests over a JSON module directory.
//!
//! Each test writes an index and its modules into a temporary directory and
//! drives the full pipeline through `StoryStore` with a
//! `JsonDirModuleLoader`.
//!
//! ```bash
//! cargo test -p storydex-engine --lib e2e_tests
//! ```

mod e2e_helpers;

pub use e2e_helpers::*;
