//! Concrete module loaders.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use storydex_domain::ModuleExports;

use super::ports::{LoaderError, ModuleLoader};

/// Serves modules from an in-memory map.
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: HashMap<String, Arc<ModuleExports>>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, import_path: impl Into<String>, exports: ModuleExports) -> Self {
        self.modules.insert(import_path.into(), Arc::new(exports));
        self
    }

    pub fn insert(&mut self, import_path: impl Into<String>, exports: Arc<ModuleExports>) {
        self.modules.insert(import_path.into(), exports);
    }
}

#[async_trait]
impl ModuleLoader for StaticModuleLoader {
    async fn import(&self, import_path: &str) -> Result<Arc<ModuleExports>, LoaderError> {
        self.modules
            .get(import_path)
            .cloned()
            .ok_or_else(|| LoaderError::NotFound(import_path.to_string()))
    }
}

/// Reads JSON modules from a directory.
///
/// `./Button.stories.json` resolves to `<root>/Button.stories.json`. Parsed
/// exports are memoized per path so repeated imports return the same `Arc`;
/// failed reads are not memoized and will be retried on the next import.
pub struct JsonDirModuleLoader {
    root: PathBuf,
    loaded: DashMap<String, Arc<ModuleExports>>,
}

impl JsonDirModuleLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            loaded: DashMap::new(),
        }
    }

    fn resolve(&self, import_path: &str) -> Result<PathBuf, LoaderError> {
        let relative = Path::new(import_path);
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::CurDir => {}
                Component::Normal(part) => resolved.push(part),
                _ => {
                    return Err(LoaderError::NotFound(format!(
                        "{import_path} (import paths must stay inside the module root)"
                    )))
                }
            }
        }
        Ok(resolved)
    }
}

#[async_trait]
impl ModuleLoader for JsonDirModuleLoader {
    async fn import(&self, import_path: &str) -> Result<Arc<ModuleExports>, LoaderError> {
        if let Some(cached) = self.loaded.get(import_path) {
            return Ok(Arc::clone(cached.value()));
        }

        let path = self.resolve(import_path)?;
        tracing::debug!(import_path, path = %path.display(), "Reading module");

        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LoaderError::NotFound(import_path.to_string())
            } else {
                LoaderError::io(import_path, e)
            }
        })?;
        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| LoaderError::parse(import_path, e))?;
        let exports =
            ModuleExports::from_json(value).map_err(|e| LoaderError::parse(import_path, e))?;

        let exports = self
            .loaded
            .entry(import_path.to_string())
            .or_insert_with(|| Arc::new(exports))
            .clone();
        Ok(exports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storydex_domain::ComponentAnnotations;

    #[tokio::test]
    async fn static_loader_returns_same_arc() {
        let loader = StaticModuleLoader::new()
            .with_module("./a.json", ModuleExports::new(ComponentAnnotations::default()));

        let first = loader.import("./a.json").await.unwrap();
        let second = loader.import("./a.json").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let missing = loader.import("./b.json").await;
        assert!(matches!(missing, Err(LoaderError::NotFound(p)) if p == "./b.json"));
    }

    #[tokio::test]
    async fn json_loader_memoizes_successful_reads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Button.stories.json"),
            r#"{ "default": { "title": "Button" }, "Primary": {} }"#,
        )
        .unwrap();
        let loader = JsonDirModuleLoader::new(dir.path());

        let first = loader.import("./Button.stories.json").await.unwrap();
        let second = loader.import("./Button.stories.json").await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(first.named.contains_key("Primary"));
    }

    #[tokio::test]
    async fn json_loader_retries_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let loader = JsonDirModuleLoader::new(dir.path());

        let missing = loader.import("./Late.stories.json").await;
        assert!(matches!(missing, Err(LoaderError::NotFound(_))));

        std::fs::write(
            dir.path().join("Late.stories.json"),
            r#"{ "default": { "title": "Late" } }"#,
        )
        .unwrap();
        assert!(loader.import("./Late.stories.json").await.is_ok());
    }

    #[tokio::test]
    async fn json_loader_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let loader = JsonDirModuleLoader::new(dir.path());
        assert!(loader.import("../secrets.json").await.is_err());
    }

    #[tokio::test]
    async fn json_loader_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Bad.json"), "not json").unwrap();
        let loader = JsonDirModuleLoader::new(dir.path());

        let err = loader.import("./Bad.json").await.unwrap_err();
        assert!(matches!(err, LoaderError::Parse { .. }));
    }
}
