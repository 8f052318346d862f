//! Prepared stories and the context handed to renderers.

use std::fmt;
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use serde_json::Value;

use crate::annotations::{ArgsMap, Decorator, Loader, Render};
use crate::ids::EntryId;

/// Fully merged, render-ready story definition.
///
/// Derived deterministically from story, component and project annotations
/// and never mutated afterwards; current args live in the args store.
#[derive(Debug, Clone)]
pub struct PreparedStory {
    pub id: EntryId,
    pub name: String,
    pub title: String,
    pub component_id: String,
    pub export_name: String,
    pub tags: Vec<String>,
    pub parameters: ArgsMap,
    pub arg_types: ArgsMap,
    pub initial_args: ArgsMap,
    /// Project decorators first, story decorators last.
    pub decorators: Vec<Decorator>,
    /// Project loaders first, story loaders last.
    pub loaders: Vec<Loader>,
    /// Render implementation without decorators applied.
    pub undecorated_render: Render,
}

impl PreparedStory {
    /// Stories flagged `docsOnly` exist only to be referenced from docs.
    pub fn is_docs_only(&self) -> bool {
        self.parameters
            .get("docsOnly")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Render through the decorator chain.
    ///
    /// The first decorator is the outermost wrapper, so project decorators
    /// wrap component decorators which wrap story decorators.
    pub fn render(&self, ctx: &StoryContext) -> Value {
        apply_decorators(&self.decorators, &self.undecorated_render, ctx)
    }

    /// Run every loader concurrently and merge their results in declaration
    /// order; later loaders win on key conflicts.
    pub async fn run_loaders(&self, ctx: &StoryContext) -> ArgsMap {
        let results = join_all(self.loaders.iter().map(|l| l.call(ctx.clone()))).await;
        let mut loaded = ArgsMap::new();
        for result in results {
            loaded.extend(result);
        }
        loaded
    }
}

fn apply_decorators(decorators: &[Decorator], render: &Render, ctx: &StoryContext) -> Value {
    match decorators.split_first() {
        None => render.call(ctx),
        Some((outer, rest)) => outer.call(ctx, &|inner_ctx: &StoryContext| {
            apply_decorators(rest, render, inner_ctx)
        }),
    }
}

/// Per-story hook state: callbacks to run when the story is torn down.
#[derive(Default)]
pub struct HooksContext {
    cleanups: Mutex<Vec<Box<dyn FnOnce() + Send>>>,
}

impl HooksContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_cleanup(&self, callback: impl FnOnce() + Send + 'static) {
        self.cleanups.lock().push(Box::new(callback));
    }

    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.lock().len()
    }

    /// Run and drop every registered cleanup, returning how many ran.
    pub fn clean(&self) -> usize {
        let callbacks = std::mem::take(&mut *self.cleanups.lock());
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }
}

impl fmt::Debug for HooksContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HooksContext")
            .field("pending_cleanups", &self.pending_cleanups())
            .finish()
    }
}

/// Everything a renderer sees for one story.
#[derive(Debug, Clone)]
pub struct StoryContext {
    pub id: EntryId,
    pub name: String,
    pub title: String,
    pub tags: Vec<String>,
    pub parameters: ArgsMap,
    pub arg_types: ArgsMap,
    pub initial_args: ArgsMap,
    pub args: ArgsMap,
    pub globals: ArgsMap,
    pub loaded: ArgsMap,
    pub hooks: Arc<HooksContext>,
}

impl StoryContext {
    pub fn new(
        story: &PreparedStory,
        args: ArgsMap,
        globals: ArgsMap,
        hooks: Arc<HooksContext>,
    ) -> Self {
        Self {
            id: story.id.clone(),
            name: story.name.clone(),
            title: story.title.clone(),
            tags: story.tags.clone(),
            parameters: story.parameters.clone(),
            arg_types: story.arg_types.clone(),
            initial_args: story.initial_args.clone(),
            args,
            globals,
            loaded: ArgsMap::new(),
            hooks,
        }
    }
}
