//! Merge rules for combining annotation layers.
//!
//! Layers are always passed from least to most specific (project,
//! component, story); later layers win.

use serde_json::{json, Value};

use crate::annotations::ArgsMap;

/// Deep-merge `overlay` into `target`.
///
/// Nested objects merge key by key; any other value (arrays included)
/// replaces what was there.
pub fn deep_merge(target: &mut ArgsMap, overlay: &ArgsMap) {
    for (key, value) in overlay {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Deep-merge parameter layers.
pub fn combine_parameters<'a>(layers: impl IntoIterator<Item = &'a ArgsMap>) -> ArgsMap {
    let mut combined = ArgsMap::new();
    for layer in layers {
        deep_merge(&mut combined, layer);
    }
    combined
}

/// Shallow-merge layers: each key is taken whole from the last layer that
/// declares it.
pub fn combine_args<'a>(layers: impl IntoIterator<Item = &'a ArgsMap>) -> ArgsMap {
    let mut combined = ArgsMap::new();
    for layer in layers {
        combined.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    combined
}

/// Concatenate tag layers.
///
/// A tag written `!name` removes `name` from what came before; duplicates
/// keep their first position.
pub fn combine_tags<'a>(layers: impl IntoIterator<Item = &'a [String]>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in layers.into_iter().flatten() {
        if let Some(removed) = tag.strip_prefix('!') {
            tags.retain(|t| t != removed);
        } else if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

/// Expand shorthand arg types and fill in each one's `name`.
///
/// `{"size": "string"}` becomes
/// `{"size": {"name": "size", "type": {"name": "string"}}}`.
pub fn normalize_arg_types(arg_types: &ArgsMap) -> ArgsMap {
    arg_types
        .iter()
        .map(|(key, value)| {
            let normalized = match value {
                Value::String(type_name) => json!({ "name": key, "type": { "name": type_name } }),
                Value::Object(fields) => {
                    let mut fields = fields.clone();
                    if let Some(Value::String(type_name)) = fields.get("type").cloned() {
                        fields.insert("type".into(), json!({ "name": type_name }));
                    }
                    fields
                        .entry("name")
                        .or_insert_with(|| Value::String(key.clone()));
                    Value::Object(fields)
                }
                other => other.clone(),
            };
            (key.clone(), normalized)
        })
        .collect()
}

fn infer_type(value: &Value) -> Value {
    match value {
        Value::String(_) => json!({ "name": "string" }),
        Value::Number(_) => json!({ "name": "number" }),
        Value::Bool(_) => json!({ "name": "boolean" }),
        Value::Array(items) => json!({
            "name": "array",
            "value": items.first().map(infer_type).unwrap_or_else(|| json!({ "name": "other" })),
        }),
        Value::Object(fields) => {
            let inferred: ArgsMap = fields.iter().map(|(k, v)| (k.clone(), infer_type(v))).collect();
            json!({ "name": "object", "value": inferred })
        }
        Value::Null => json!({ "name": "other", "value": "null" }),
    }
}

/// Infer an arg type for every arg from its value.
pub fn infer_arg_types(args: &ArgsMap) -> ArgsMap {
    args.iter()
        .map(|(key, value)| (key.clone(), json!({ "name": key, "type": infer_type(value) })))
        .collect()
}

/// Combine declared arg types with ones inferred from args.
///
/// Declared arg types win over inferred ones but inherit the inferred
/// `type` when they omit it.
pub fn enhance_arg_types(declared: &ArgsMap, args: &ArgsMap) -> ArgsMap {
    let mut enhanced = infer_arg_types(args);
    for (key, value) in declared {
        match (enhanced.get_mut(key), value) {
            (Some(Value::Object(inferred)), Value::Object(fields)) => {
                for (field, field_value) in fields {
                    inferred.insert(field.clone(), field_value.clone());
                }
            }
            _ => {
                enhanced.insert(key.clone(), value.clone());
            }
        }
    }
    enhanced
}

/// Collect the `defaultValue` of each arg type that declares one.
pub fn default_values(arg_types: &ArgsMap) -> ArgsMap {
    arg_types
        .iter()
        .filter_map(|(key, value)| {
            value
                .get("defaultValue")
                .map(|default| (key.clone(), default.clone()))
        })
        .collect()
}

/// Keys of `current` whose values differ from `base`.
pub fn args_delta(base: &ArgsMap, current: &ArgsMap) -> ArgsMap {
    current
        .iter()
        .filter(|(key, value)| base.get(key.as_str()) != Some(*value))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}
