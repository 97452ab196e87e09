//! Module registry and trait definitions
//!
//! A beacon module is the implementation a configured beacon runs. Modules
//! are registered once by name; a pass resolves a module id to a module with
//! a plain map lookup.

use beacond_core::{Grains, ValidationOutcome};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// The BeaconModule trait — implement this to add a new check.
#[async_trait::async_trait]
pub trait BeaconModule: Send + Sync {
    /// Module id (e.g. "ps", "status").
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str {
        ""
    }

    /// Whether this module validates its own configuration.
    ///
    /// When false, callers fall back to generic validation and `validate`
    /// is never called.
    fn provides_validate(&self) -> bool {
        false
    }

    /// Module-specific validation of an already list-shaped config.
    fn validate(&self, _config: &[Value]) -> ValidationOutcome {
        ValidationOutcome::valid()
    }

    /// Run the check. Returns a list of result mappings, or a single result.
    async fn execute(&self, config: &[Value], grains: &Grains) -> anyhow::Result<Value>;
}

#[derive(Clone, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, Arc<dyn BeaconModule>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module. Replaces any existing module with the same name.
    pub fn register(&mut self, module: impl BeaconModule + 'static) {
        self.register_arc(Arc::new(module));
    }

    pub fn register_arc(&mut self, module: Arc<dyn BeaconModule>) {
        let name = module.name().to_string();
        self.modules.insert(name, module);
    }

    /// Remove a module by name.
    pub fn remove(&mut self, name: &str) -> bool {
        self.modules.remove(name).is_some()
    }

    pub fn resolve(&self, module_id: &str) -> Option<Arc<dyn BeaconModule>> {
        self.modules.get(module_id).cloned()
    }

    pub fn contains(&self, module_id: &str) -> bool {
        self.modules.contains_key(module_id)
    }

    pub fn list(&self) -> Vec<&str> {
        self.modules.keys().map(|s| s.as_str()).collect()
    }

    /// List only modules that provide their own validation.
    pub fn list_validating(&self) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|(_, m)| m.provides_validate())
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// A registry shared across passes.
///
/// Readers take a snapshot at the start of a pass and keep it for the whole
/// pass; writers swap in a complete new table, so a reload is never visible
/// half-way through a pass.
#[derive(Clone, Default)]
pub struct SharedRegistry {
    inner: Arc<RwLock<Arc<ModuleRegistry>>>,
}

impl SharedRegistry {
    pub fn new(registry: ModuleRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    pub async fn snapshot(&self) -> Arc<ModuleRegistry> {
        self.inner.read().await.clone()
    }

    /// Replace the whole table.
    pub async fn replace(&self, registry: ModuleRegistry) {
        *self.inner.write().await = Arc::new(registry);
    }

    /// Copy the current table, edit the copy, and swap it in.
    pub async fn update<F>(&self, edit: F)
    where
        F: FnOnce(&mut ModuleRegistry),
    {
        let mut guard = self.inner.write().await;
        let mut next = (**guard).clone();
        edit(&mut next);
        *guard = Arc::new(next);
    }
}

impl From<ModuleRegistry> for SharedRegistry {
    fn from(registry: ModuleRegistry) -> Self {
        Self::new(registry)
    }
}
