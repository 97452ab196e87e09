//! Beacond Engine — turns configured beacons into tagged events, one pass at a time
//!
//! raw config -> module resolution -> validation -> isolated execution -> tagging

pub mod isolate;
pub mod orchestrator;
pub mod table;
pub mod tag;
pub mod validate;

pub use isolate::{CheckOutcome, ExecutionIsolator};
pub use orchestrator::{Beacon, BeaconOptions};
pub use table::BeaconTable;
pub use tag::EventTagger;
pub use validate::{ConfigValidator, Validation, ValidationPath};
