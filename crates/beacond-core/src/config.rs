//! Agent configuration
//!
//! Everything the beacon agent reads at startup lives here. Loaded from TOML,
//! falls back to defaults if no config file exists.

use crate::error::{Error, Result};
use crate::types::{BeaconConfigs, Grains};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Top-level agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Agent id. Used as the host id when grains carry none.
    pub id: Option<String>,
    /// First tag segments, before `/<host id>/<beacon>/`.
    pub tag_prefix: String,
    /// Per-check execution timeout in seconds.
    pub check_timeout_secs: u64,
    /// Seconds between passes in `beacond run`.
    pub loop_interval_secs: u64,
    /// Run the beacons of one pass concurrently.
    pub concurrent: bool,
    /// procfs mount read by the builtin modules.
    pub proc_root: String,
    /// Static host facts.
    pub grains: Grains,
    /// Beacon name -> list of single-key option mappings.
    pub beacons: BeaconConfigs,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            id: None,
            tag_prefix: "salt/beacon".into(),
            check_timeout_secs: 30,
            loop_interval_secs: 1,
            concurrent: false,
            proc_root: "/proc".into(),
            grains: Grains::new(),
            beacons: BeaconConfigs::new(),
        }
    }
}

impl AgentConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {} - using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {} - using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The agent id, or the machine hostname, or `localhost`.
    pub fn agent_id(&self) -> String {
        self.id
            .clone()
            .or_else(|| std::env::var("HOSTNAME").ok().filter(|h| !h.is_empty()))
            .unwrap_or_else(|| "localhost".to_string())
    }

    /// Static grains with `id` filled in from the agent id when missing.
    pub fn grains(&self) -> Grains {
        let mut grains = self.grains.clone();
        if !grains.contains_key("id") {
            grains.insert("id".into(), Value::String(self.agent_id()));
        }
        grains
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    pub fn loop_interval(&self) -> Duration {
        Duration::from_secs(self.loop_interval_secs.max(1))
    }
}

/// Load a standalone beacon mapping from a `.toml` or `.json` file.
///
/// The top level is the beacon mapping itself; a `beacons` table wrapping it
/// is accepted too.
pub fn load_beacons(path: &Path) -> Result<BeaconConfigs> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => {
            return Err(Error::Config(format!(
                "unsupported beacon file type: {}",
                path.display()
            )))
        }
    };
    match value {
        Value::Object(map) => {
            if map.len() == 1 {
                if let Some(Value::Object(inner)) = map.get("beacons") {
                    return Ok(inner.clone());
                }
            }
            Ok(map)
        }
        _ => Err(Error::Config(format!(
            "beacon file {} must contain a mapping",
            path.display()
        ))),
    }
}
