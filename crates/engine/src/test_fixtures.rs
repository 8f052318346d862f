//! Builders shared by unit tests.

use serde_json::{json, Value};
use storydex_domain::{
    ArgsMap, ComponentAnnotations, EntryId, IndexEntry, ModuleExport, ModuleExports,
    PreparedStory, ProjectAnnotations, Render, StoryAnnotations, StoryIndex,
};

/// A JSON object literal as an `ArgsMap`. Panics on non-objects.
pub fn args(value: Value) -> ArgsMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Render that echoes the args and globals it was given.
pub fn echo_render() -> Render {
    Render::new(|ctx| json!({ "args": ctx.args, "globals": ctx.globals }))
}

pub fn prepared_story(id: &str, initial_args: ArgsMap) -> PreparedStory {
    PreparedStory {
        id: EntryId::from(id),
        name: "Story".into(),
        title: "Component".into(),
        component_id: "component".into(),
        export_name: "Story".into(),
        tags: Vec::new(),
        parameters: ArgsMap::new(),
        arg_types: ArgsMap::new(),
        initial_args,
        decorators: Vec::new(),
        loaders: Vec::new(),
        undecorated_render: echo_render(),
    }
}

pub fn story_annotations(id: &str, name: &str) -> StoryAnnotations {
    StoryAnnotations {
        id: EntryId::from(id),
        name: name.into(),
        export_name: name.into(),
        args: ArgsMap::new(),
        arg_types: ArgsMap::new(),
        parameters: ArgsMap::new(),
        tags: Vec::new(),
        decorators: Vec::new(),
        loaders: Vec::new(),
        render: None,
    }
}

/// `Example/Button` with `Primary` and `LargeSize` stories.
pub fn button_module() -> ModuleExports {
    let meta = ComponentAnnotations {
        title: Some("Example/Button".into()),
        component: Some("Button".into()),
        args: args(json!({ "label": "Button" })),
        tags: vec!["autodocs".into()],
        ..ComponentAnnotations::default()
    };
    ModuleExports::new(meta)
        .with_export("Primary", ModuleExport::Value(json!({ "args": { "primary": true } })))
        .with_export(
            "LargeSize",
            ModuleExport::Value(json!({ "args": { "size": "large" } })),
        )
}

/// Exports of a docs page; never processed as a story module.
pub fn docs_module() -> ModuleExports {
    ModuleExports::default()
}

pub fn project() -> ProjectAnnotations {
    ProjectAnnotations {
        globals: args(json!({ "theme": "light" })),
        global_types: args(json!({ "locale": { "defaultValue": "en" } })),
        parameters: args(json!({ "framework": "html" })),
        render: Some(echo_render()),
        ..ProjectAnnotations::default()
    }
}

/// Two Button stories and an Intro docs page referencing the Button module.
pub fn sample_index() -> StoryIndex {
    StoryIndex::new([
        IndexEntry::story(
            "example-button--primary",
            "Example/Button",
            "Primary",
            "./Button.json",
        ),
        IndexEntry::story(
            "example-button--large-size",
            "Example/Button",
            "Large Size",
            "./Button.json",
        ),
        IndexEntry::docs(
            "example-intro--docs",
            "Example/Intro",
            "./Intro.mdx",
            vec!["./Button.json".into()],
        ),
    ])
}
