//! beacond — host beacon agent
//!
//! The engine lives in the workspace crates; this package is the process
//! around it: config loading, the pass loop, and event output.

pub mod runner;

pub use runner::{write_events, Agent};
