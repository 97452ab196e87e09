//! status module — periodic system load report

use crate::registry::BeaconModule;
use beacond_core::Grains;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

pub struct StatusModule {
    proc_root: PathBuf,
}

impl StatusModule {
    pub fn new(proc_root: impl AsRef<Path>) -> Self {
        Self {
            proc_root: proc_root.as_ref().to_path_buf(),
        }
    }
}

fn parse_loadavg(content: &str) -> anyhow::Result<[f64; 3]> {
    let mut fields = content.split_whitespace();
    let mut out = [0.0; 3];
    for slot in out.iter_mut() {
        let field = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("loadavg has fewer than 3 fields"))?;
        *slot = field.parse()?;
    }
    Ok(out)
}

#[async_trait::async_trait]
impl BeaconModule for StatusModule {
    fn name(&self) -> &str {
        "status"
    }

    fn description(&self) -> &str {
        "Report system load averages every pass"
    }

    // Any list is accepted; the caller checks the list shape.
    fn provides_validate(&self) -> bool {
        true
    }

    async fn execute(&self, _config: &[Value], _grains: &Grains) -> anyhow::Result<Value> {
        let path = self.proc_root.join("loadavg");
        let content = fs::read_to_string(&path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        let [one, five, fifteen] = parse_loadavg(&content)?;
        Ok(json!([{
            "loadavg": {"1-min": one, "5-min": five, "15-min": fifteen}
        }]))
    }
}
