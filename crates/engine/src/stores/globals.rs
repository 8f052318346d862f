//! Global values shared by every story.

use std::collections::HashSet;

use parking_lot::RwLock;
use storydex_domain::merge::{args_delta, default_values};
use storydex_domain::ArgsMap;

#[derive(Debug, Default)]
struct GlobalsState {
    allowed: HashSet<String>,
    initial: ArgsMap,
    current: ArgsMap,
}

impl GlobalsState {
    /// Keep only declared global names, warning about the rest.
    fn filter_allowed(&self, update: &ArgsMap) -> ArgsMap {
        update
            .iter()
            .filter(|(key, _)| {
                let allowed = self.allowed.contains(key.as_str());
                if !allowed {
                    tracing::warn!(
                        global = %key,
                        "Ignoring global that is not declared in globals or global types"
                    );
                }
                allowed
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Current global values plus the declarations that constrain them.
#[derive(Debug, Default)]
pub struct GlobalsStore {
    state: RwLock<GlobalsState>,
}

impl GlobalsStore {
    pub fn new(globals: &ArgsMap, global_types: &ArgsMap) -> Self {
        let store = Self::default();
        store.set(globals, global_types);
        store
    }

    /// Re-seed from new declarations.
    ///
    /// Initial globals are the global types' default values overlaid with
    /// `globals`. Values the user changed relative to the previous initial
    /// globals are re-applied when their names are still declared.
    pub fn set(&self, globals: &ArgsMap, global_types: &ArgsMap) {
        let mut state = self.state.write();
        let delta = args_delta(&state.initial, &state.current);

        state.allowed = globals
            .keys()
            .chain(global_types.keys())
            .cloned()
            .collect();
        let mut initial = default_values(global_types);
        initial.extend(globals.iter().map(|(k, v)| (k.clone(), v.clone())));
        state.initial = initial.clone();
        state.current = initial;

        if !delta.is_empty() {
            let preserved = state.filter_allowed(&delta);
            state.current.extend(preserved);
        }
    }

    pub fn get(&self) -> ArgsMap {
        self.state.read().current.clone()
    }

    pub fn initial(&self) -> ArgsMap {
        self.state.read().initial.clone()
    }

    /// Merge declared names from `update` into the current globals.
    pub fn update(&self, update: &ArgsMap) {
        let mut state = self.state.write();
        let allowed = state.filter_allowed(update);
        state.current.extend(allowed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::args;
    use serde_json::{json, Value};

    #[test]
    fn initial_globals_include_type_defaults() {
        let store = GlobalsStore::new(
            &args(json!({ "locale": "en" })),
            &args(json!({ "theme": { "defaultValue": "light" }, "locale": {} })),
        );
        assert_eq!(Value::Object(store.get()), json!({ "theme": "light", "locale": "en" }));
    }

    #[test]
    fn update_merges_declared_names_only() {
        let store = GlobalsStore::new(&args(json!({ "theme": "light", "locale": "en" })), &ArgsMap::new());
        store.update(&args(json!({ "theme": "dark", "bogus": 1 })));

        assert_eq!(Value::Object(store.get()), json!({ "theme": "dark", "locale": "en" }));
    }

    #[test]
    fn set_reseeds_without_losing_user_changes() {
        let store = GlobalsStore::new(&args(json!({ "theme": "light", "locale": "en" })), &ArgsMap::new());
        store.update(&args(json!({ "theme": "dark" })));

        store.set(&args(json!({ "theme": "light", "locale": "fr", "density": "compact" })), &ArgsMap::new());

        assert_eq!(
            Value::Object(store.get()),
            json!({ "theme": "dark", "locale": "fr", "density": "compact" })
        );
        assert_eq!(store.initial()["theme"], "light");
    }

    #[test]
    fn set_drops_changes_to_undeclared_globals() {
        let store = GlobalsStore::new(&args(json!({ "theme": "light" })), &ArgsMap::new());
        store.update(&args(json!({ "theme": "dark" })));

        store.set(&args(json!({ "locale": "en" })), &ArgsMap::new());
        assert_eq!(Value::Object(store.get()), json!({ "locale": "en" }));
    }
}
