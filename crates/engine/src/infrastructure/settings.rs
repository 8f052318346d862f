//! Store settings.
//!
//! Cache bounds and batch size are tunables: a larger batch lowers latency
//! of full loads at the cost of more concurrent in-flight module loads.

use std::num::NonZeroUsize;

/// Maximum distinct module records retained.
pub const DEFAULT_MODULE_CACHE_CAPACITY: usize = 1000;
/// Maximum distinct prepared stories retained.
pub const DEFAULT_STORY_CACHE_CAPACITY: usize = 10_000;
/// Module loads issued concurrently by a full load.
pub const DEFAULT_BATCH_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub module_cache_capacity: NonZeroUsize,
    pub story_cache_capacity: NonZeroUsize,
    pub batch_size: NonZeroUsize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            module_cache_capacity: non_zero(DEFAULT_MODULE_CACHE_CAPACITY),
            story_cache_capacity: non_zero(DEFAULT_STORY_CACHE_CAPACITY),
            batch_size: non_zero(DEFAULT_BATCH_SIZE),
        }
    }
}

fn non_zero(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
}

impl StoreSettings {
    /// Read settings from `STORYDEX_*` environment variables, keeping the
    /// default for anything unset or invalid.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str, default: NonZeroUsize| match lookup(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<NonZeroUsize>() {
                Ok(value) => value,
                Err(_) => {
                    tracing::warn!(key, value = %raw, "Ignoring invalid setting, using default");
                    default
                }
            },
        };

        Self {
            module_cache_capacity: read(
                "STORYDEX_MODULE_CACHE_SIZE",
                defaults.module_cache_capacity,
            ),
            story_cache_capacity: read("STORYDEX_STORY_CACHE_SIZE", defaults.story_cache_capacity),
            batch_size: read("STORYDEX_BATCH_SIZE", defaults.batch_size),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = non_zero(batch_size);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_cache_bounds() {
        let settings = StoreSettings::default();
        assert_eq!(settings.module_cache_capacity.get(), 1000);
        assert_eq!(settings.story_cache_capacity.get(), 10_000);
        assert_eq!(settings.batch_size.get(), 20);
    }

    #[test]
    fn lookup_overrides_and_ignores_invalid() {
        let env: HashMap<&str, &str> = [
            ("STORYDEX_BATCH_SIZE", "5"),
            ("STORYDEX_STORY_CACHE_SIZE", "0"),
            ("STORYDEX_MODULE_CACHE_SIZE", "lots"),
        ]
        .into_iter()
        .collect();

        let settings = StoreSettings::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(settings.batch_size.get(), 5);
        assert_eq!(settings.story_cache_capacity.get(), 10_000);
        assert_eq!(settings.module_cache_capacity.get(), 1000);
    }
}
