//! Index configuration registry.
//!
//! The registry maps index names to their [`IndexConfiguration`]: which public
//! sort aliases exist, which fields take part in prefix search, and the
//! settings/mappings used to create the index. It is populated once at startup
//! and only read afterwards.
//!
//! Lookups never fail. An index without a registered configuration resolves to
//! an empty one, so queries against it degrade to an unsorted, unfiltered listing.

mod blog;
mod config;

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

pub use blog::{BLOG_INDEX, blog_index, sample_documents};
pub use config::{IndexConfiguration, text_with_keyword};

static BUILTIN: LazyLock<IndexRegistry> = LazyLock::new(IndexRegistry::builtin);

/// Read-only lookup table of index configurations.
#[derive(Debug, Clone, Default)]
pub struct IndexRegistry {
    indices: HashMap<String, IndexConfiguration>,
}

impl IndexRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in index definitions.
    pub fn builtin() -> Self {
        Self::new().with_index(blog_index())
    }

    /// Returns the process-wide built-in registry.
    pub fn global() -> &'static IndexRegistry {
        &BUILTIN
    }

    /// Adds (or replaces) a configuration.
    pub fn with_index(mut self, config: IndexConfiguration) -> Self {
        self.register(config);
        self
    }

    /// Adds a configuration, returning the one it replaced.
    pub fn register(&mut self, config: IndexConfiguration) -> Option<IndexConfiguration> {
        self.indices.insert(config.index_name.clone(), config)
    }

    /// Returns the configuration registered for `index`.
    pub fn get(&self, index: &str) -> Option<&IndexConfiguration> {
        self.indices.get(index)
    }

    /// Returns the configuration for `index`, or an empty one if unregistered.
    pub fn resolve(&self, index: &str) -> Cow<'_, IndexConfiguration> {
        match self.indices.get(index) {
            Some(config) => Cow::Borrowed(config),
            None => Cow::Owned(IndexConfiguration::new(index)),
        }
    }

    /// Returns true if `index` has a configuration.
    pub fn contains(&self, index: &str) -> bool {
        self.indices.contains_key(index)
    }

    /// Returns the registered index names, sorted.
    pub fn index_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.indices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered indices.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}
