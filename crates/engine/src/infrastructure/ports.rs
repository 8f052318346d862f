//! Port traits for infrastructure boundaries.
//!
//! The module loader is the only external collaborator the store calls
//! into. Everything else is concrete types.

use std::sync::Arc;

use async_trait::async_trait;
use storydex_domain::ModuleExports;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum LoaderError {
    #[error("Module not found: {0}")]
    NotFound(String),
    #[error("Failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },
    #[error("Loader failed: {0}")]
    Failed(String),
}

impl LoaderError {
    pub fn io(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

// =============================================================================
// Module Loading
// =============================================================================

/// Supplies module exports by import path.
///
/// Implementations must be idempotent: importing the same path twice should
/// return the same `Arc` so downstream identity caches hit.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModuleLoader: Send + Sync {
    async fn import(&self, import_path: &str) -> Result<Arc<ModuleExports>, LoaderError>;
}
