//! Beacon table — the editable set of configured beacons.
//!
//! Adds and modifications are validated against the registry before they
//! land, so a pass never sees a config the table itself accepted as bad.

use crate::validate::ConfigValidator;
use beacond_core::{
    beacon_module_override, is_beacon_disabled, BeaconConfigs, Error, Result, ENABLED_KEY,
};
use beacond_modules::ModuleRegistry;
use serde_json::{Map, Value};
use tracing::info;

#[derive(Clone, Debug, Default)]
pub struct BeaconTable {
    beacons: BeaconConfigs,
}

impl BeaconTable {
    pub fn new(beacons: BeaconConfigs) -> Self {
        Self { beacons }
    }

    pub fn configs(&self) -> &BeaconConfigs {
        &self.beacons
    }

    /// Configured beacon names, in order. The global switch is not a beacon.
    pub fn list(&self) -> Vec<&str> {
        self.beacons
            .iter()
            .filter(|(name, value)| !(name.as_str() == ENABLED_KEY && value.is_boolean()))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.beacons.get(name)
    }

    /// Whether beacons run at all.
    pub fn is_enabled(&self) -> bool {
        self.beacons.get(ENABLED_KEY) != Some(&Value::Bool(false))
    }

    /// Whether one beacon runs.
    pub fn is_beacon_enabled(&self, name: &str) -> Option<bool> {
        self.beacons.get(name).map(|cfg| !is_beacon_disabled(cfg))
    }

    pub fn add(
        &mut self,
        registry: &ModuleRegistry,
        validator: &ConfigValidator,
        name: &str,
        config: Value,
    ) -> Result<()> {
        if self.beacons.contains_key(name) {
            return Err(Error::BeaconExists(name.to_string()));
        }
        check(registry, validator, name, &config)?;
        self.beacons.insert(name.to_string(), config);
        info!("Added beacon {}", name);
        Ok(())
    }

    pub fn modify(
        &mut self,
        registry: &ModuleRegistry,
        validator: &ConfigValidator,
        name: &str,
        config: Value,
    ) -> Result<()> {
        if !self.beacons.contains_key(name) {
            return Err(Error::BeaconNotFound(name.to_string()));
        }
        check(registry, validator, name, &config)?;
        self.beacons.insert(name.to_string(), config);
        info!("Modified beacon {}", name);
        Ok(())
    }

    /// Remove a beacon, returning its config.
    pub fn delete(&mut self, name: &str) -> Result<Value> {
        let removed = self
            .beacons
            .shift_remove(name)
            .ok_or_else(|| Error::BeaconNotFound(name.to_string()))?;
        info!("Deleted beacon {}", name);
        Ok(removed)
    }

    pub fn enable_beacon(&mut self, name: &str) -> Result<()> {
        self.set_beacon_enabled(name, true)
    }

    pub fn disable_beacon(&mut self, name: &str) -> Result<()> {
        self.set_beacon_enabled(name, false)
    }

    pub fn enable_all(&mut self) {
        self.beacons.insert(ENABLED_KEY.to_string(), Value::Bool(true));
    }

    pub fn disable_all(&mut self) {
        self.beacons.insert(ENABLED_KEY.to_string(), Value::Bool(false));
    }

    fn set_beacon_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let config = self
            .beacons
            .get_mut(name)
            .ok_or_else(|| Error::BeaconNotFound(name.to_string()))?;
        let entries = config.as_array_mut().ok_or_else(|| {
            Error::config_invalid(name, "Configuration for beacon must be a list.")
        })?;

        match entries.iter_mut().find(|e| e.get(ENABLED_KEY).is_some()) {
            Some(entry) => *entry = enabled_entry(enabled),
            None => entries.push(enabled_entry(enabled)),
        }
        Ok(())
    }
}

fn enabled_entry(enabled: bool) -> Value {
    let mut entry = Map::new();
    entry.insert(ENABLED_KEY.to_string(), Value::Bool(enabled));
    Value::Object(entry)
}

fn check(
    registry: &ModuleRegistry,
    validator: &ConfigValidator,
    name: &str,
    config: &Value,
) -> Result<()> {
    let module_id = beacon_module_override(config).unwrap_or(name);
    let module = registry
        .resolve(module_id)
        .ok_or_else(|| Error::ModuleNotFound(module_id.to_string()))?;
    let validation = validator.validate(name, module_id, module.as_ref(), config);
    if validation.is_valid() {
        Ok(())
    } else {
        Err(Error::config_invalid(name, validation.outcome.message))
    }
}
