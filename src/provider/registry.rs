//! Provider Registry
//!
//! Maps a provider kind string (e.g. "sequence") to a constructor closure.
//! Components are wired explicitly at startup; nothing is discovered
//! dynamically at runtime. A constructor that fails leaves no partially
//! configured provider behind, and the node refuses to start.

use super::ontology::OntologyLookupProvider;
use super::sequence::SequenceSearchProvider;
use super::types::ExternalResultsProvider;
use crate::error::{Result, XJoinError};

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Construction-time configuration for one provider instance. Process-wide
/// lifetime, not per-query.
#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    values: BTreeMap<String, String>,
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// Fetches a required key; absence or emptiness is a construction error.
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| XJoinError::Configuration(format!("{} parameter is required", key)))
    }
}

impl<const N: usize> From<[(&str, &str); N]> for ProviderConfig {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut config = Self::new();
        for (key, value) in pairs {
            config.set(key, value);
        }
        config
    }
}

impl From<BTreeMap<String, String>> for ProviderConfig {
    fn from(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }
}

/// Type alias for a provider constructor closure.
pub type ProviderBuilderFn =
    Arc<dyn Fn(&ProviderConfig) -> Result<Arc<dyn ExternalResultsProvider>> + Send + Sync>;

/// Registry holding the mapping between provider kinds and their constructors.
pub struct ProviderRegistry {
    builders: DashMap<String, ProviderBuilderFn>,
}

impl ProviderRegistry {
    /// Creates a new, empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            builders: DashMap::new(),
        })
    }

    /// Creates a registry with both built-in provider kinds registered.
    pub fn with_builtins() -> Arc<Self> {
        let registry = Self::new();

        registry.register("sequence", |config| {
            Ok(Arc::new(SequenceSearchProvider::from_config(config)?)
                as Arc<dyn ExternalResultsProvider>)
        });
        registry.register("ontology", |config| {
            Ok(Arc::new(OntologyLookupProvider::from_config(config)?)
                as Arc<dyn ExternalResultsProvider>)
        });

        registry
    }

    /// Registers a constructor under a provider kind.
    pub fn register<F>(&self, kind: &str, builder: F)
    where
        F: Fn(&ProviderConfig) -> Result<Arc<dyn ExternalResultsProvider>> + Send + Sync + 'static,
    {
        self.builders.insert(kind.to_string(), Arc::new(builder));
        tracing::info!("Registered provider kind: {}", kind);
    }

    /// Constructs a provider of the given kind. Unknown kinds and
    /// constructor failures are both configuration errors.
    pub fn build(
        &self,
        kind: &str,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn ExternalResultsProvider>> {
        let builder = self.builders.get(kind).ok_or_else(|| {
            XJoinError::Configuration(format!("unknown provider kind: {}", kind))
        })?;

        builder.value()(config)
    }

    pub fn has_kind(&self, kind: &str) -> bool {
        self.builders.contains_key(kind)
    }

    pub fn kinds(&self) -> Vec<String> {
        self.builders.iter().map(|entry| entry.key().clone()).collect()
    }
}
