//! Core types for beacond

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Host facts handed read-only to every check.
pub type Grains = Map<String, Value>;

/// Beacon name -> raw check configuration, in document order.
pub type BeaconConfigs = Map<String, Value>;

/// Config entry that routes a beacon to a differently named module.
pub const BEACON_MODULE_KEY: &str = "beacon_module";

/// Metadata entry appended to a check's config before execution.
pub const BEACON_NAME_KEY: &str = "_beacon_name";

/// Per-beacon (inside the list) or global (top-level) on/off switch.
pub const ENABLED_KEY: &str = "enabled";

/// One tagged check outcome, ready for the event bus.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub tag: String,
    pub data: Value,
    pub beacon_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Event {
    pub fn success(tag: impl Into<String>, data: Value, beacon_name: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            data,
            beacon_name: beacon_name.into(),
            error: None,
        }
    }

    pub fn failure(
        tag: impl Into<String>,
        beacon_name: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            data: Value::Object(Map::new()),
            beacon_name: beacon_name.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of validating one beacon's configuration. Always a value, never an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: String,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            message: "Valid beacon configuration".to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }

    /// The fixed user-facing phrasing for a non-list config seen by a module validator.
    pub fn not_a_list(module_id: &str) -> Self {
        Self::invalid(format!(
            "Configuration for {} beacon must be a list.",
            module_id
        ))
    }
}

/// Find the `{"beacon_module": X}` override in a beacon's config list.
pub fn beacon_module_override(config: &Value) -> Option<&str> {
    config
        .as_array()?
        .iter()
        .find_map(|entry| entry.get(BEACON_MODULE_KEY))
        .and_then(Value::as_str)
}

/// Whether a beacon's config list carries `{"enabled": false}`.
pub fn is_beacon_disabled(config: &Value) -> bool {
    config
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get(ENABLED_KEY))
                .any(|v| v == &Value::Bool(false))
        })
        .unwrap_or(false)
}
