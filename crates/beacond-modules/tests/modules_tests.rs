//! Tests for beacond-modules: ModuleRegistry, SharedRegistry, and builtin modules against a fake procfs

use beacond_core::{Grains, ValidationOutcome};
use beacond_modules::modules::{ps::PsModule, status::StatusModule};
use beacond_modules::*;
use serde_json::{json, Value};
use std::path::Path;

fn fake_proc(processes: &[(u32, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (pid, comm) in processes {
        let pid_dir = dir.path().join(pid.to_string());
        std::fs::create_dir_all(&pid_dir).unwrap();
        std::fs::write(pid_dir.join("comm"), format!("{comm}\n")).unwrap();
    }
    // Non-pid entries are ignored.
    std::fs::create_dir_all(dir.path().join("sys")).unwrap();
    std::fs::write(dir.path().join("loadavg"), "0.50 0.40 0.30 1/200 999\n").unwrap();
    dir
}

fn list(config: Value) -> Vec<Value> {
    config.as_array().cloned().unwrap()
}

struct EchoModule;

#[async_trait::async_trait]
impl BeaconModule for EchoModule {
    fn name(&self) -> &str {
        "echo"
    }

    async fn execute(&self, config: &[Value], _grains: &Grains) -> anyhow::Result<Value> {
        Ok(Value::Array(config.to_vec()))
    }
}

// ===========================================================================
// ModuleRegistry
// ===========================================================================

#[test]
fn registry_default_is_empty() {
    let reg = ModuleRegistry::new();
    assert!(reg.is_empty());
    assert!(reg.resolve("ps").is_none());
}

#[test]
fn create_default_registry_has_builtins() {
    let reg = create_default_registry("/proc");
    assert_eq!(reg.list(), vec!["ps", "status"]);
    assert_eq!(reg.list_validating(), vec!["ps", "status"]);
}

#[test]
fn register_replace_and_remove() {
    let mut reg = ModuleRegistry::new();
    reg.register(EchoModule);
    reg.register(EchoModule);
    assert_eq!(reg.len(), 1);
    assert!(reg.contains("echo"));
    assert!(!reg.resolve("echo").unwrap().provides_validate());
    assert!(reg.remove("echo"));
    assert!(!reg.remove("echo"));
}

#[tokio::test]
async fn default_validate_is_valid() {
    let reg = {
        let mut r = ModuleRegistry::new();
        r.register(EchoModule);
        r
    };
    let module = reg.resolve("echo").unwrap();
    assert_eq!(module.validate(&[]), ValidationOutcome::valid());
    let out = module.execute(&[json!({"a": 1})], &Grains::new()).await.unwrap();
    assert_eq!(out, json!([{"a": 1}]));
}

// ===========================================================================
// SharedRegistry
// ===========================================================================

#[tokio::test]
async fn snapshot_is_unaffected_by_later_update() {
    let shared = SharedRegistry::new(ModuleRegistry::new());
    let before = shared.snapshot().await;
    shared.update(|reg| reg.register(EchoModule)).await;
    let after = shared.snapshot().await;
    assert!(before.resolve("echo").is_none());
    assert!(after.resolve("echo").is_some());
}

#[tokio::test]
async fn replace_swaps_whole_table() {
    let shared: SharedRegistry = create_default_registry("/proc").into();
    shared.replace(ModuleRegistry::new()).await;
    assert!(shared.snapshot().await.is_empty());
}

// ===========================================================================
// ps
// ===========================================================================

#[tokio::test]
async fn ps_reports_stopped_and_running() {
    let proc_dir = fake_proc(&[(1, "init"), (42, "sshd")]);
    let module = PsModule::new(proc_dir.path());
    let config = list(json!([{"processes": {"apache2": "stopped", "sshd": "running", "init": "stopped"}}]));
    let out = module.execute(&config, &Grains::new()).await.unwrap();
    assert_eq!(out, json!([{"apache2": "Stopped", "sshd": "Running"}]));
}

#[tokio::test]
async fn ps_nothing_matched_is_empty_list() {
    let proc_dir = fake_proc(&[(7, "apache2")]);
    let module = PsModule::new(proc_dir.path());
    let config = list(json!([{"processes": {"apache2": "stopped"}}]));
    let out = module.execute(&config, &Grains::new()).await.unwrap();
    assert_eq!(out, json!([]));
}

#[tokio::test]
async fn ps_ignores_trailing_metadata_entries() {
    let proc_dir = fake_proc(&[]);
    let module = PsModule::new(proc_dir.path());
    let config = list(json!([
        {"processes": {"apache2": "stopped"}},
        {"beacon_module": "ps"},
        {"_beacon_name": "watch_apache"}
    ]));
    let out = module.execute(&config, &Grains::new()).await.unwrap();
    assert_eq!(out, json!([{"apache2": "Stopped"}]));
}

#[tokio::test]
async fn ps_missing_proc_root_is_an_error() {
    let module = PsModule::new(Path::new("/nonexistent/proc"));
    let config = list(json!([{"processes": {"apache2": "stopped"}}]));
    assert!(module.execute(&config, &Grains::new()).await.is_err());
}

#[test]
fn ps_validate_requires_processes() {
    let module = PsModule::new("/proc");
    assert!(module.validate(&list(json!([{"processes": {"a": "running"}}]))).valid);
    let outcome = module.validate(&list(json!([{"beacon_module": "ps"}])));
    assert!(!outcome.valid);
    assert_eq!(outcome.message, "Configuration for ps beacon requires processes.");
}

// ===========================================================================
// status
// ===========================================================================

#[tokio::test]
async fn status_reads_loadavg() {
    let proc_dir = fake_proc(&[]);
    let module = StatusModule::new(proc_dir.path());
    let out = module.execute(&[], &Grains::new()).await.unwrap();
    assert_eq!(
        out,
        json!([{"loadavg": {"1-min": 0.5, "5-min": 0.4, "15-min": 0.3}}])
    );
}

#[tokio::test]
async fn status_missing_loadavg_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let module = StatusModule::new(dir.path());
    let err = module.execute(&[], &Grains::new()).await.unwrap_err();
    assert!(err.to_string().contains("loadavg"));
}
