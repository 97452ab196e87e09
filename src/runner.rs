//! Agent runner — wires config, registry, and engine together and drives passes.

use beacond_core::{
    beacon_module_override, AgentConfig, BeaconConfigs, Event, Grains, ValidationOutcome,
    ENABLED_KEY,
};
use beacond_engine::{Beacon, BeaconOptions, ConfigValidator};
use beacond_modules::{create_default_registry, ModuleRegistry};
use std::io::Write;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct Agent {
    beacon: Beacon,
    beacons: BeaconConfigs,
    grains: Grains,
    interval: Duration,
}

impl Agent {
    /// Build an agent with the builtin modules reading `config.proc_root`.
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::with_registry(config, create_default_registry(&config.proc_root))
    }

    pub fn with_registry(config: &AgentConfig, registry: ModuleRegistry) -> Self {
        Self {
            beacon: Beacon::new(registry, BeaconOptions::from(config)),
            beacons: config.beacons.clone(),
            grains: config.grains(),
            interval: config.loop_interval(),
        }
    }

    /// Replace the configured beacons (e.g. from a separate beacon file).
    pub fn set_beacons(&mut self, beacons: BeaconConfigs) {
        self.beacons = beacons;
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn beacon(&self) -> &Beacon {
        &self.beacon
    }

    pub async fn run_once(&self) -> Vec<Event> {
        self.beacon.process(&self.beacons, &self.grains).await
    }

    /// Validate every configured beacon without running it.
    pub async fn validate_all(&self) -> Vec<(String, ValidationOutcome)> {
        let registry = self.beacon.registry().snapshot().await;
        let validator: &ConfigValidator = self.beacon.validator();
        self.beacons
            .iter()
            .filter(|(name, value)| !(name.as_str() == ENABLED_KEY && value.is_boolean()))
            .map(|(name, raw)| {
                let module_id = beacon_module_override(raw).unwrap_or(name.as_str());
                let outcome = match registry.resolve(module_id) {
                    Some(module) => {
                        validator
                            .validate(name, module_id, module.as_ref(), raw)
                            .outcome
                    }
                    None => ValidationOutcome::invalid(format!(
                        "Beacon module {} not found",
                        module_id
                    )),
                };
                (name.clone(), outcome)
            })
            .collect()
    }

    /// Run one pass per tick until cancelled (or `max_passes` is reached),
    /// writing every event as a JSON line. Returns the number of passes run.
    pub async fn run<W: Write>(
        &self,
        out: &mut W,
        cancel: &CancellationToken,
        max_passes: Option<u64>,
    ) -> anyhow::Result<u64> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut passes = 0u64;

        info!(
            "Starting beacon loop: {} beacons every {:?}",
            self.beacons.len(),
            self.interval
        );
        loop {
            if max_passes.is_some_and(|max| passes >= max) {
                break;
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let events = self
                        .beacon
                        .process_with_cancel(&self.beacons, &self.grains, cancel)
                        .await;
                    write_events(out, &events)?;
                    passes += 1;
                    debug!("Pass {} emitted {} events", passes, events.len());
                }
            }
        }
        info!("Beacon loop stopped after {} passes", passes);
        Ok(passes)
    }
}

/// Write events as JSON lines.
pub fn write_events<W: Write>(out: &mut W, events: &[Event]) -> anyhow::Result<()> {
    for event in events {
        serde_json::to_writer(&mut *out, event)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}
