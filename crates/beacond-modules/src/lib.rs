//! Beacond Modules — check implementations and the registry that dispatches to them
//!
//! Each builtin module is a self-contained file in src/modules/.
//! To add a module: create the file, implement BeaconModule, register below.

pub mod modules;
pub mod registry;

pub use registry::{BeaconModule, ModuleRegistry, SharedRegistry};

use std::path::Path;

/// Create the default registry with all builtin modules.
///
/// `proc_root` is the procfs mount the modules read (normally `/proc`).
pub fn create_default_registry(proc_root: impl AsRef<Path>) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    let root = proc_root.as_ref();

    registry.register(modules::ps::PsModule::new(root));
    registry.register(modules::status::StatusModule::new(root));

    registry
}
