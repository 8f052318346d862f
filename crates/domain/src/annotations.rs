//! Annotation types at the three configuration layers.
//!
//! Annotations are declarative metadata attachable at project, component or
//! story level. Data fields (args, parameters, tags, ...) deserialize from
//! JSON; function fields (render, decorators, loaders) can only be attached
//! from code and are skipped by serde.
//!
//! Once wrapped in an `Arc` an annotation object is treated as immutable: the
//! engine caches derived values keyed by that `Arc`'s identity.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::DomainError;
use crate::ids::EntryId;
use crate::story::StoryContext;

/// JSON object used for args, parameters, arg types and globals.
pub type ArgsMap = serde_json::Map<String, Value>;

// =============================================================================
// Function annotations
// =============================================================================

/// Story render implementation.
#[derive(Clone)]
pub struct Render(Arc<dyn Fn(&StoryContext) -> Value + Send + Sync>);

impl Render {
    pub fn new(f: impl Fn(&StoryContext) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, ctx: &StoryContext) -> Value {
        (self.0)(ctx)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Render {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Render(..)")
    }
}

/// Wraps the rest of the render chain.
///
/// The decorator receives the context and a callback rendering everything
/// inside it; it may alter the context before calling through.
#[derive(Clone)]
pub struct Decorator(
    Arc<dyn Fn(&StoryContext, &dyn Fn(&StoryContext) -> Value) -> Value + Send + Sync>,
);

impl Decorator {
    pub fn new(
        f: impl Fn(&StoryContext, &dyn Fn(&StoryContext) -> Value) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, ctx: &StoryContext, inner: &dyn Fn(&StoryContext) -> Value) -> Value {
        (self.0)(ctx, inner)
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Decorator(..)")
    }
}

/// Asynchronous data loader run before rendering; its object result is
/// merged into `StoryContext::loaded`.
#[derive(Clone)]
pub struct Loader(Arc<dyn Fn(StoryContext) -> BoxFuture<'static, ArgsMap> + Send + Sync>);

impl Loader {
    pub fn new(f: impl Fn(StoryContext) -> BoxFuture<'static, ArgsMap> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, ctx: StoryContext) -> BoxFuture<'static, ArgsMap> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for Loader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Loader(..)")
    }
}

// =============================================================================
// Export filters
// =============================================================================

/// Selects which named exports of a module are stories.
#[derive(Debug, Clone)]
pub enum ExportFilter {
    Names(Vec<String>),
    Pattern(regex_lite::Regex),
}

impl ExportFilter {
    pub fn pattern(pattern: &str) -> Result<Self, DomainError> {
        regex_lite::Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|e| DomainError::InvalidExportFilter {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })
    }

    pub fn matches(&self, export_name: &str) -> bool {
        match self {
            Self::Names(names) => names.iter().any(|n| n == export_name),
            Self::Pattern(re) => re.is_match(export_name),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawExportFilter {
    Names(Vec<String>),
    Pattern(String),
}

fn deserialize_filter<'de, D>(deserializer: D) -> Result<Option<ExportFilter>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawExportFilter>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(RawExportFilter::Names(names)) => Ok(Some(ExportFilter::Names(names))),
        Some(RawExportFilter::Pattern(p)) => ExportFilter::pattern(&p)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

// =============================================================================
// Annotation layers
// =============================================================================

/// Project-wide defaults.
///
/// Replaced wholesale; a new `Arc<ProjectAnnotations>` invalidates every
/// prepared story derived from the previous one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectAnnotations {
    pub globals: ArgsMap,
    pub global_types: ArgsMap,
    pub args: ArgsMap,
    pub arg_types: ArgsMap,
    pub parameters: ArgsMap,
    pub tags: Vec<String>,
    #[serde(skip)]
    pub decorators: Vec<Decorator>,
    #[serde(skip)]
    pub loaders: Vec<Loader>,
    #[serde(skip)]
    pub render: Option<Render>,
}

/// Component-level annotations: the default export of a story module.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComponentAnnotations {
    pub id: Option<String>,
    pub title: Option<String>,
    pub component: Option<String>,
    pub args: ArgsMap,
    pub arg_types: ArgsMap,
    pub parameters: ArgsMap,
    pub tags: Vec<String>,
    #[serde(deserialize_with = "deserialize_filter")]
    pub include_stories: Option<ExportFilter>,
    #[serde(deserialize_with = "deserialize_filter")]
    pub exclude_stories: Option<ExportFilter>,
    #[serde(skip)]
    pub decorators: Vec<Decorator>,
    #[serde(skip)]
    pub loaders: Vec<Loader>,
    #[serde(skip)]
    pub render: Option<Render>,
}

impl ComponentAnnotations {
    /// Whether a named export should be interpreted as a story.
    pub fn is_story_export(&self, export_name: &str) -> bool {
        if export_name == "__esModule" {
            return false;
        }
        let included = self
            .include_stories
            .as_ref()
            .map_or(true, |f| f.matches(export_name));
        let excluded = self
            .exclude_stories
            .as_ref()
            .is_some_and(|f| f.matches(export_name));
        included && !excluded
    }
}

/// A story written as an object export.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StoryObject {
    pub name: Option<String>,
    /// Older spelling of `name`.
    pub story_name: Option<String>,
    pub args: ArgsMap,
    pub arg_types: ArgsMap,
    pub parameters: ArgsMap,
    pub tags: Vec<String>,
    #[serde(skip)]
    pub decorators: Vec<Decorator>,
    #[serde(skip)]
    pub loaders: Vec<Loader>,
    #[serde(skip)]
    pub render: Option<Render>,
}

/// Normalized story annotations held by a module record.
#[derive(Debug, Clone)]
pub struct StoryAnnotations {
    pub id: EntryId,
    pub name: String,
    pub export_name: String,
    pub args: ArgsMap,
    pub arg_types: ArgsMap,
    pub parameters: ArgsMap,
    pub tags: Vec<String>,
    pub decorators: Vec<Decorator>,
    pub loaders: Vec<Loader>,
    pub render: Option<Render>,
}

// =============================================================================
// Module exports
// =============================================================================

/// One named export of a loaded module.
#[derive(Debug, Clone)]
pub enum ModuleExport {
    /// A bare function: shorthand for `{ render }`.
    Render(Render),
    /// A story object built in code.
    Story(StoryObject),
    /// Raw data, interpreted as a story object if its shape allows.
    Value(Value),
}

impl ModuleExport {
    /// Interpret the export as a story object.
    pub fn to_story_object(&self) -> Result<StoryObject, DomainError> {
        match self {
            Self::Render(render) => Ok(StoryObject {
                render: Some(render.clone()),
                ..StoryObject::default()
            }),
            Self::Story(story) => Ok(story.clone()),
            Self::Value(value @ Value::Object(_)) => serde_json::from_value(value.clone())
                .map_err(|e| DomainError::invalid_annotations(e.to_string())),
            Self::Value(other) => Err(DomainError::invalid_annotations(format!(
                "expected a function or an object, found {}",
                json_type_name(other)
            ))),
        }
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Exports of one loaded source module.
#[derive(Debug, Clone, Default)]
pub struct ModuleExports {
    pub default: Option<ComponentAnnotations>,
    pub named: IndexMap<String, ModuleExport>,
    /// Explicit story order; exports not listed keep their relative order
    /// after the listed ones.
    pub named_exports_order: Option<Vec<String>>,
}

impl ModuleExports {
    pub fn new(default: ComponentAnnotations) -> Self {
        Self {
            default: Some(default),
            ..Self::default()
        }
    }

    pub fn with_export(mut self, name: impl Into<String>, export: ModuleExport) -> Self {
        self.named.insert(name.into(), export);
        self
    }

    pub fn with_story(self, name: impl Into<String>, story: StoryObject) -> Self {
        self.with_export(name, ModuleExport::Story(story))
    }

    pub fn with_render(self, name: impl Into<String>, render: Render) -> Self {
        self.with_export(name, ModuleExport::Render(render))
    }

    /// Parse a JSON module: `default` holds component annotations,
    /// `__namedExportsOrder` the optional order, every other key a named
    /// export.
    pub fn from_json(value: Value) -> Result<Self, DomainError> {
        let Value::Object(fields) = value else {
            return Err(DomainError::invalid_annotations(
                "module exports must be a JSON object",
            ));
        };

        let mut exports = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "default" => {
                    let meta = serde_json::from_value(value)
                        .map_err(|e| DomainError::invalid_annotations(e.to_string()))?;
                    exports.default = Some(meta);
                }
                "__namedExportsOrder" => {
                    let order = serde_json::from_value(value)
                        .map_err(|e| DomainError::invalid_annotations(e.to_string()))?;
                    exports.named_exports_order = Some(order);
                }
                _ => {
                    exports.named.insert(key, ModuleExport::Value(value));
                }
            }
        }
        Ok(exports)
    }

    /// Named exports in story order.
    pub fn ordered_exports(&self) -> Vec<(&str, &ModuleExport)> {
        let Some(order) = &self.named_exports_order else {
            return self.named.iter().map(|(k, v)| (k.as_str(), v)).collect();
        };
        let mut out: Vec<(&str, &ModuleExport)> = order
            .iter()
            .filter_map(|name| self.named.get_key_value(name.as_str()))
            .map(|(k, v)| (k.as_str(), v))
            .collect();
        out.extend(
            self.named
                .iter()
                .filter(|(k, _)| !order.contains(*k))
                .map(|(k, v)| (k.as_str(), v)),
        );
        out
    }
}
