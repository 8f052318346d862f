//! Temporary module directories for end-to-end tests.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use storydex_domain::{ProjectAnnotations, Render, StoryIndex};
use tempfile::TempDir;

use crate::infrastructure::loaders::JsonDirModuleLoader;
use crate::infrastructure::settings::StoreSettings;
use crate::store::StoryStore;

/// A store initialized against modules written to a temporary directory.
pub struct E2ETestContext {
    pub dir: TempDir,
    pub store: Arc<StoryStore>,
}

impl E2ETestContext {
    /// Write `modules` (import path, JSON) and `index` to a fresh directory
    /// and initialize a store over them.
    pub fn setup(index: Value, modules: &[(&str, Value)]) -> Self {
        Self::setup_with(index, modules, project(), StoreSettings::default())
    }

    pub fn setup_with(
        index: Value,
        modules: &[(&str, Value)],
        project: ProjectAnnotations,
        settings: StoreSettings,
    ) -> Self {
        let dir = TempDir::new().expect("Temp dir should be created");
        for (import_path, module) in modules {
            write_json(dir.path(), import_path, module);
        }

        let index: StoryIndex = serde_json::from_value(index).expect("Index should parse");
        let store = Arc::new(StoryStore::new(project, settings));
        store
            .initialize(index, Arc::new(JsonDirModuleLoader::new(dir.path())))
            .expect("Store should initialize");
        Self { dir, store }
    }

    /// Overwrite one module on disk.
    pub fn write_module(&self, import_path: &str, module: &Value) {
        write_json(self.dir.path(), import_path, module);
    }
}

fn write_json(root: &Path, import_path: &str, value: &Value) {
    let path = root.join(import_path.trim_start_matches("./"));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Module dir should be created");
    }
    let raw = serde_json::to_vec_pretty(value).expect("Module should serialize");
    std::fs::write(path, raw).expect("Module should be written");
}

/// Project annotations with a render that echoes its context.
pub fn project() -> ProjectAnnotations {
    let mut project: ProjectAnnotations = serde_json::from_value(json!({
        "globals": { "theme": "light" },
        "globalTypes": { "locale": { "defaultValue": "en", "type": "string" } },
        "parameters": { "framework": "html", "layout": "padded" },
        "tags": ["dev", "test"]
    }))
    .expect("Project annotations should parse");
    project.render = Some(Render::new(|ctx| {
        json!({ "id": ctx.id, "args": ctx.args, "globals": ctx.globals })
    }));
    project
}

/// An index with a Button component, a Card component in a nested folder and
/// a docs page referencing both.
pub fn library_index() -> Value {
    json!({
        "v": 4,
        "entries": {
            "example-button--primary": {
                "id": "example-button--primary",
                "type": "story",
                "importPath": "./Button.json",
                "title": "Example/Button",
                "name": "Primary"
            },
            "example-button--secondary": {
                "id": "example-button--secondary",
                "type": "story",
                "importPath": "./Button.json",
                "title": "Example/Button",
                "name": "Secondary"
            },
            "example-card--default": {
                "id": "example-card--default",
                "type": "story",
                "importPath": "./cards/Card.json",
                "title": "Example/Card",
                "name": "Default"
            },
            "example-card--docs-only": {
                "id": "example-card--docs-only",
                "type": "story",
                "importPath": "./cards/Card.json",
                "title": "Example/Card",
                "name": "Docs Only"
            },
            "example-overview--docs": {
                "id": "example-overview--docs",
                "type": "docs",
                "importPath": "./Overview.json",
                "title": "Example/Overview",
                "storiesImports": ["./Button.json", "./cards/Card.json"]
            }
        }
    })
}

pub fn button_module() -> Value {
    json!({
        "default": {
            "title": "Example/Button",
            "component": "Button",
            "includeStories": ["Primary", "Secondary"],
            "args": { "label": "Button", "size": "medium" },
            "argTypes": { "size": { "control": "select", "options": ["small", "medium", "large"] } },
            "tags": ["autodocs", "!test"]
        },
        "__namedExportsOrder": ["Primary", "Secondary"],
        "Secondary": { "args": { "primary": false } },
        "Primary": { "args": { "primary": true }, "parameters": { "layout": "centered" } },
        "buttonData": [1, 2, 3]
    })
}

pub fn card_module() -> Value {
    json!({
        "default": {
            "title": "Example/Card",
            "excludeStories": ".*Data$",
            "parameters": { "backgrounds": { "default": "light" } }
        },
        "Default": { "args": { "heading": "Hello" } },
        "DocsOnly": { "parameters": { "docsOnly": true } },
        "cardData": { "not": "a story" }
    })
}

pub fn overview_module() -> Value {
    json!({ "default": { "title": "Example/Overview" } })
}

pub fn library_modules() -> Vec<(&'static str, Value)> {
    vec![
        ("./Button.json", button_module()),
        ("./cards/Card.json", card_module()),
        ("./Overview.json", overview_module()),
    ]
}
