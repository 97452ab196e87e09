//! Builtin beacon modules.
//!
//! To add a module:
//! 1. Create a new file in this directory
//! 2. Implement the BeaconModule trait
//! 3. Add `pub mod <name>;` here
//! 4. Register it in create_default_registry() in ../lib.rs

pub mod ps;
pub mod status;
