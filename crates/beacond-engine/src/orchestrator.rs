//! Beacon orchestrator — one pass over every configured beacon.
//!
//! Each beacon moves through resolve -> validate -> execute -> tag within the
//! pass. A beacon that cannot be resolved or fails validation is logged and
//! contributes no events; a beacon whose module fails contributes exactly one
//! error event. Output order always follows the configuration order.

use crate::isolate::{CheckOutcome, ExecutionIsolator};
use crate::tag::EventTagger;
use crate::validate::{ConfigValidator, ValidationPath};
use beacond_core::{
    beacon_module_override, is_beacon_disabled, AgentConfig, BeaconConfigs, Event, Grains,
    ENABLED_KEY,
};
use beacond_modules::{ModuleRegistry, SharedRegistry};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Per-engine settings.
#[derive(Clone, Debug)]
pub struct BeaconOptions {
    /// Host id used when grains carry no `id`.
    pub agent_id: String,
    pub tag_prefix: String,
    pub check_timeout: Duration,
    /// Run a pass's beacons concurrently. Output order is unchanged.
    pub concurrent: bool,
}

impl Default for BeaconOptions {
    fn default() -> Self {
        Self {
            agent_id: "localhost".into(),
            tag_prefix: "salt/beacon".into(),
            check_timeout: Duration::from_secs(30),
            concurrent: false,
        }
    }
}

impl From<&AgentConfig> for BeaconOptions {
    fn from(config: &AgentConfig) -> Self {
        Self {
            agent_id: config.agent_id(),
            tag_prefix: config.tag_prefix.clone(),
            check_timeout: config.check_timeout(),
            concurrent: config.concurrent,
        }
    }
}

pub struct Beacon {
    registry: SharedRegistry,
    validator: ConfigValidator,
    isolator: ExecutionIsolator,
    options: BeaconOptions,
}

impl Beacon {
    pub fn new(registry: impl Into<SharedRegistry>, options: BeaconOptions) -> Self {
        Self {
            registry: registry.into(),
            validator: ConfigValidator::new(),
            isolator: ExecutionIsolator::new(options.check_timeout),
            options,
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    pub fn validator(&self) -> &ConfigValidator {
        &self.validator
    }

    pub fn options(&self) -> &BeaconOptions {
        &self.options
    }

    /// Run every configured beacon once and return the events of the pass.
    pub async fn process(&self, configs: &BeaconConfigs, grains: &Grains) -> Vec<Event> {
        self.process_with_cancel(configs, grains, &CancellationToken::new())
            .await
    }

    /// Like `process`, but stops between beacons once `cancel` fires and
    /// returns what the pass produced so far. A running check is never
    /// interrupted.
    pub async fn process_with_cancel(
        &self,
        configs: &BeaconConfigs,
        grains: &Grains,
        cancel: &CancellationToken,
    ) -> Vec<Event> {
        if configs.get(ENABLED_KEY) == Some(&Value::Bool(false)) {
            debug!("Beacons are disabled, skipping pass");
            return Vec::new();
        }

        let registry = self.registry.snapshot().await;
        let tagger = EventTagger::for_pass(&self.options.tag_prefix, &self.options.agent_id, grains);
        let grains = Arc::new(grains.clone());

        let beacons: Vec<(&str, &Value)> = configs
            .iter()
            .filter(|(name, value)| !(name.as_str() == ENABLED_KEY && value.is_boolean()))
            .map(|(name, value)| (name.as_str(), value))
            .collect();

        let mut events = Vec::new();
        let mut attempted = 0usize;

        if self.options.concurrent {
            if !cancel.is_cancelled() {
                let pipelines = beacons.iter().map(|(name, raw)| {
                    self.process_beacon(&registry, &tagger, &grains, name, raw)
                });
                attempted = beacons.len();
                for group in futures::future::join_all(pipelines).await {
                    events.extend(group);
                }
            }
        } else {
            for (name, raw) in &beacons {
                if cancel.is_cancelled() {
                    info!(
                        "Beacon pass cancelled after {} of {} beacons",
                        attempted,
                        beacons.len()
                    );
                    break;
                }
                attempted += 1;
                events.extend(
                    self.process_beacon(&registry, &tagger, &grains, name, raw)
                        .await,
                );
            }
        }

        debug!(
            "Beacon pass complete: {} beacons attempted, {} events",
            attempted,
            events.len()
        );
        events
    }

    async fn process_beacon(
        &self,
        registry: &ModuleRegistry,
        tagger: &EventTagger,
        grains: &Arc<Grains>,
        beacon_name: &str,
        raw_config: &Value,
    ) -> Vec<Event> {
        if is_beacon_disabled(raw_config) {
            debug!("Beacon {} is disabled, not running", beacon_name);
            return Vec::new();
        }

        let module_id = beacon_module_override(raw_config).unwrap_or(beacon_name);
        let Some(module) = registry.resolve(module_id) else {
            error!(
                "Unable to process beacon {}: module {} not found",
                beacon_name, module_id
            );
            return Vec::new();
        };

        let validation = self
            .validator
            .validate(beacon_name, module_id, module.as_ref(), raw_config);
        if !validation.is_valid() {
            match validation.path {
                ValidationPath::Module => error!(
                    "Beacon {} configuration invalid, not running.\n{}",
                    beacon_name, validation.outcome.message
                ),
                ValidationPath::Generic => error!("{}", validation.outcome.message),
            }
            return Vec::new();
        }

        let Some(entries) = raw_config.as_array() else {
            return Vec::new();
        };

        let outcome = self
            .isolator
            .run(module, beacon_name, module_id, entries, grains.clone())
            .await;
        if let CheckOutcome::Failure(message) = &outcome {
            error!(
                "Beacon {} (module {}) failed: {}",
                beacon_name, module_id, message
            );
        }

        tagger.tag(beacon_name, module_id, outcome)
    }
}
