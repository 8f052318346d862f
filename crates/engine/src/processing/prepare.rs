//! Story preparation: merging story, component and project layers.

use std::num::NonZeroUsize;
use std::sync::Arc;

use storydex_domain::merge::{
    combine_args, combine_parameters, combine_tags, enhance_arg_types, normalize_arg_types,
};
use storydex_domain::{ComponentAnnotations, PreparedStory, ProjectAnnotations, StoryAnnotations};

use crate::error::StoreError;
use crate::infrastructure::cache::{ByAddress, MemoCache};

/// Normalize project annotations once, before they are used as a cache key.
pub fn normalize_project(mut project: ProjectAnnotations) -> ProjectAnnotations {
    project.arg_types = normalize_arg_types(&project.arg_types);
    project.global_types = normalize_arg_types(&project.global_types);
    project
}

/// Merge the three annotation layers into a render-ready story.
///
/// Parameters merge deeply, args and arg types shallowly. Decorators and
/// loaders concatenate from project to story, so project decorators end up
/// outermost.
pub fn prepare_story(
    story: &StoryAnnotations,
    component: &ComponentAnnotations,
    project: &ProjectAnnotations,
) -> Result<PreparedStory, StoreError> {
    let render = story
        .render
        .as_ref()
        .or(component.render.as_ref())
        .or(project.render.as_ref())
        .cloned()
        .ok_or_else(|| StoreError::Preparation {
            story_id: story.id.clone(),
            reason: "no render function at story, component or project level".into(),
        })?;

    let parameters = combine_parameters([&project.parameters, &component.parameters, &story.parameters]);
    let initial_args = combine_args([&project.args, &component.args, &story.args]);
    let declared_arg_types = combine_args([&project.arg_types, &component.arg_types, &story.arg_types]);
    let arg_types = enhance_arg_types(&declared_arg_types, &initial_args);
    let tags = combine_tags([
        project.tags.as_slice(),
        component.tags.as_slice(),
        story.tags.as_slice(),
    ]);

    let decorators = project
        .decorators
        .iter()
        .chain(&component.decorators)
        .chain(&story.decorators)
        .cloned()
        .collect();
    let loaders = project
        .loaders
        .iter()
        .chain(&component.loaders)
        .chain(&story.loaders)
        .cloned()
        .collect();

    Ok(PreparedStory {
        id: story.id.clone(),
        name: story.name.clone(),
        title: component.title.clone().unwrap_or_default(),
        component_id: component.id.clone().unwrap_or_default(),
        export_name: story.export_name.clone(),
        tags,
        parameters,
        arg_types,
        initial_args,
        decorators,
        loaders,
        undecorated_render: render,
    })
}

type StoryKey = (
    ByAddress<StoryAnnotations>,
    ByAddress<ComponentAnnotations>,
    ByAddress<ProjectAnnotations>,
);

/// Memoized `prepare_story`, keyed by the identity of all three layers.
pub struct StoryCache {
    inner: MemoCache<StoryKey, Arc<PreparedStory>>,
}

impl StoryCache {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: MemoCache::new("story", capacity),
        }
    }

    pub fn prepare(
        &self,
        story: &Arc<StoryAnnotations>,
        component: &Arc<ComponentAnnotations>,
        project: &Arc<ProjectAnnotations>,
    ) -> Result<Arc<PreparedStory>, StoreError> {
        let key = (
            ByAddress::new(story),
            ByAddress::new(component),
            ByAddress::new(project),
        );
        self.inner.get_or_try_insert_with(key, || {
            prepare_story(story, component, project).map(Arc::new)
        })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{args, echo_render, story_annotations};
    use serde_json::{json, Value};
    use storydex_domain::{ArgsMap, Decorator, HooksContext, Render, StoryContext};

    fn component() -> ComponentAnnotations {
        ComponentAnnotations {
            id: Some("button".into()),
            title: Some("Button".into()),
            args: args(json!({ "size": "md", "label": "Component" })),
            parameters: args(json!({ "layout": "centered", "docs": { "page": "auto" } })),
            tags: vec!["autodocs".into()],
            ..ComponentAnnotations::default()
        }
    }

    fn project() -> ProjectAnnotations {
        ProjectAnnotations {
            args: args(json!({ "theme": "light", "size": "sm" })),
            parameters: args(json!({ "docs": { "source": "code" } })),
            tags: vec!["dev".into(), "test".into()],
            render: Some(echo_render()),
            ..ProjectAnnotations::default()
        }
    }

    fn wrap(label: &'static str) -> Decorator {
        Decorator::new(move |ctx, inner| json!(format!("{label}({})", inner(ctx).as_str().unwrap_or(""))))
    }

    #[test]
    fn layers_merge_with_story_precedence() {
        let mut story = story_annotations("button--primary", "Primary");
        story.args = args(json!({ "label": "Story" }));
        story.tags = vec!["!test".into()];

        let prepared = prepare_story(&story, &component(), &project()).unwrap();

        assert_eq!(
            Value::Object(prepared.initial_args.clone()),
            json!({ "theme": "light", "size": "md", "label": "Story" })
        );
        assert_eq!(prepared.parameters["docs"], json!({ "source": "code", "page": "auto" }));
        assert_eq!(prepared.tags, vec!["dev", "autodocs"]);
        assert_eq!(prepared.title, "Button");
        assert_eq!(prepared.component_id, "button");
        assert_eq!(prepared.arg_types["label"]["type"], json!({ "name": "string" }));
    }

    #[test]
    fn decorators_run_project_outermost() {
        let mut story = story_annotations("button--primary", "Primary");
        story.decorators = vec![wrap("story")];
        story.render = Some(Render::new(|_| json!("render")));
        let mut component = component();
        component.decorators = vec![wrap("component")];
        let mut project = project();
        project.decorators = vec![wrap("project")];

        let prepared = prepare_story(&story, &component, &project).unwrap();
        let ctx = StoryContext::new(
            &prepared,
            ArgsMap::new(),
            ArgsMap::new(),
            Arc::new(HooksContext::new()),
        );
        assert_eq!(prepared.render(&ctx), json!("project(component(story(render)))"));
    }

    #[test]
    fn story_render_overrides_project_render() {
        let mut story = story_annotations("button--primary", "Primary");
        story.render = Some(Render::new(|_| json!("own")));
        let prepared = prepare_story(&story, &component(), &project()).unwrap();
        let ctx = StoryContext::new(&prepared, ArgsMap::new(), ArgsMap::new(), Arc::new(HooksContext::new()));
        assert_eq!(prepared.undecorated_render.call(&ctx), json!("own"));
    }

    #[test]
    fn missing_render_is_a_preparation_error() {
        let story = story_annotations("button--primary", "Primary");
        let err = prepare_story(&story, &component(), &ProjectAnnotations::default()).unwrap_err();
        assert!(matches!(err, StoreError::Preparation { story_id, .. } if story_id.as_str() == "button--primary"));
    }

    #[test]
    fn project_normalization_expands_type_shorthand() {
        let project = normalize_project(ProjectAnnotations {
            global_types: args(json!({ "theme": "string" })),
            ..ProjectAnnotations::default()
        });
        assert_eq!(project.global_types["theme"]["type"], json!({ "name": "string" }));
    }

    #[test]
    fn cache_is_keyed_by_every_layer() {
        let cache = StoryCache::new(NonZeroUsize::new(8).unwrap());
        let story = Arc::new(story_annotations("button--primary", "Primary"));
        let component = Arc::new(component());
        let original = Arc::new(project());

        let first = cache.prepare(&story, &component, &original).unwrap();
        let again = cache.prepare(&story, &component, &original).unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        let replacement = Arc::new(project());
        let replaced = cache.prepare(&story, &component, &replacement).unwrap();
        assert!(!Arc::ptr_eq(&first, &replaced));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn cache_does_not_store_failures() {
        let cache = StoryCache::new(NonZeroUsize::new(8).unwrap());
        let story = Arc::new(story_annotations("button--primary", "Primary"));
        let result = cache.prepare(
            &story,
            &Arc::new(component()),
            &Arc::new(ProjectAnnotations::default()),
        );
        assert!(result.is_err());
        assert!(cache.is_empty());
    }
}
