//! Isolated check execution.
//!
//! Every module runs in its own task under a timeout. Returned errors,
//! panics, and timeouts all come back as `CheckOutcome::Failure`; nothing a
//! module does escapes this boundary.

use beacond_core::{Grains, BEACON_NAME_KEY};
use beacond_modules::BeaconModule;
use serde_json::{Map, Value};
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::debug;

#[derive(Clone, Debug, PartialEq)]
pub enum CheckOutcome {
    Success(Value),
    Failure(String),
}

#[derive(Clone, Debug)]
pub struct ExecutionIsolator {
    timeout: Duration,
}

impl Default for ExecutionIsolator {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ExecutionIsolator {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Append `{"_beacon_name": <beacon_name>}` to a validated config list.
    pub fn with_beacon_name(config: &[Value], beacon_name: &str) -> Vec<Value> {
        let mut entries = Vec::with_capacity(config.len() + 1);
        entries.extend_from_slice(config);
        let mut meta = Map::new();
        meta.insert(BEACON_NAME_KEY.to_string(), Value::String(beacon_name.to_string()));
        entries.push(Value::Object(meta));
        entries
    }

    pub async fn run(
        &self,
        module: Arc<dyn BeaconModule>,
        beacon_name: &str,
        module_id: &str,
        config: &[Value],
        grains: Arc<Grains>,
    ) -> CheckOutcome {
        let config = Self::with_beacon_name(config, beacon_name);
        debug!("Running beacon {} with module {}", beacon_name, module_id);

        let task = tokio::spawn(async move { module.execute(&config, &grains).await });
        let abort = task.abort_handle();

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(data))) => CheckOutcome::Success(data),
            Ok(Ok(Err(e))) => CheckOutcome::Failure(e.to_string()),
            Ok(Err(join_err)) => CheckOutcome::Failure(join_failure(beacon_name, join_err)),
            Err(_) => {
                abort.abort();
                CheckOutcome::Failure(format!(
                    "Beacon {} timed out after {}s",
                    beacon_name,
                    self.timeout.as_secs_f64()
                ))
            }
        }
    }
}

fn join_failure(beacon_name: &str, err: JoinError) -> String {
    if err.is_panic() {
        panic_message(err.into_panic().as_ref())
    } else {
        format!("Beacon {} was cancelled", beacon_name)
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "beacon module panicked".to_string()
    }
}
