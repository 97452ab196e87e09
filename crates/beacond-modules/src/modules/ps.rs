//! ps module — report watched processes that are running or stopped

use crate::registry::BeaconModule;
use beacond_core::{Grains, ValidationOutcome};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub struct PsModule {
    proc_root: PathBuf,
}

impl PsModule {
    pub fn new(proc_root: impl AsRef<Path>) -> Self {
        Self {
            proc_root: proc_root.as_ref().to_path_buf(),
        }
    }

    /// Names of all running processes, from `<proc_root>/<pid>/comm`.
    async fn running_processes(&self) -> anyhow::Result<HashSet<String>> {
        let mut names = HashSet::new();
        let mut entries = fs::read_dir(&self.proc_root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let is_pid = file_name
                .to_str()
                .map(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
                .unwrap_or(false);
            if !is_pid {
                continue;
            }
            // Processes can exit between read_dir and the read.
            if let Ok(comm) = fs::read_to_string(entry.path().join("comm")).await {
                names.insert(comm.trim().to_string());
            }
        }
        Ok(names)
    }
}

fn watched_processes(config: &[Value]) -> Option<&Map<String, Value>> {
    config
        .iter()
        .find_map(|entry| entry.get("processes"))
        .and_then(Value::as_object)
}

#[async_trait::async_trait]
impl BeaconModule for PsModule {
    fn name(&self) -> &str {
        "ps"
    }

    fn description(&self) -> &str {
        "Fire an event when a watched process is running or stopped"
    }

    fn provides_validate(&self) -> bool {
        true
    }

    fn validate(&self, config: &[Value]) -> ValidationOutcome {
        match watched_processes(config) {
            Some(_) => ValidationOutcome::valid(),
            None => ValidationOutcome::invalid(
                "Configuration for ps beacon requires processes.",
            ),
        }
    }

    async fn execute(&self, config: &[Value], _grains: &Grains) -> anyhow::Result<Value> {
        let watched = watched_processes(config)
            .ok_or_else(|| anyhow::anyhow!("ps beacon config has no processes"))?;
        let running = self.running_processes().await?;

        let mut ret = Map::new();
        for (process, desired) in watched {
            let is_running = running.contains(process);
            match desired.as_str() {
                Some("running") if is_running => {
                    ret.insert(process.clone(), Value::String("Running".into()));
                }
                Some("stopped") if !is_running => {
                    ret.insert(process.clone(), Value::String("Stopped".into()));
                }
                _ => {}
            }
        }

        debug!("ps: {} watched, {} matched", watched.len(), ret.len());
        if ret.is_empty() {
            Ok(Value::Array(Vec::new()))
        } else {
            Ok(Value::Array(vec![Value::Object(ret)]))
        }
    }
}
