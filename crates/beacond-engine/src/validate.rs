//! Beacon configuration validation.
//!
//! A module that provides its own validator gets the list shape checked
//! first and is then asked directly. Everything else goes through the
//! generic "must be a list" rule.

use crate::isolate::panic_message;
use beacond_core::ValidationOutcome;
use beacond_modules::BeaconModule;
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use tracing::warn;

/// Which validator produced an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationPath {
    /// The module's own `validate`.
    Module,
    /// Generic fallback for modules without one.
    Generic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validation {
    pub outcome: ValidationOutcome,
    pub path: ValidationPath,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.outcome.valid
    }
}

#[derive(Clone, Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(
        &self,
        beacon_name: &str,
        module_id: &str,
        module: &dyn BeaconModule,
        raw_config: &Value,
    ) -> Validation {
        // A panicking validator rejects the beacon with the panic text.
        let checked = panic::catch_unwind(AssertUnwindSafe(|| {
            if !module.provides_validate() {
                return None;
            }
            Some(match raw_config.as_array() {
                Some(entries) => module.validate(entries),
                None => ValidationOutcome::not_a_list(module_id),
            })
        }));
        match checked {
            Ok(Some(outcome)) => {
                return Validation {
                    outcome,
                    path: ValidationPath::Module,
                }
            }
            Ok(None) => {}
            Err(payload) => {
                return Validation {
                    outcome: ValidationOutcome::invalid(panic_message(payload.as_ref())),
                    path: ValidationPath::Module,
                }
            }
        }

        warn!(
            "No validate function found for {}, running basic beacon validation.",
            beacon_name
        );
        Validation {
            outcome: Self::generic(raw_config),
            path: ValidationPath::Generic,
        }
    }

    /// The fallback rule: a beacon config must be a list.
    pub fn generic(raw_config: &Value) -> ValidationOutcome {
        if raw_config.is_array() {
            ValidationOutcome::valid()
        } else {
            ValidationOutcome::invalid("Configuration for beacon must be a list.")
        }
    }
}
