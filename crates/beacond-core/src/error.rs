//! Error types for beacond

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("beacon {beacon} configuration invalid: {message}")]
    ConfigInvalid { beacon: String, message: String },

    #[error("beacon module not found: {0}")]
    ModuleNotFound(String),

    #[error("beacon already configured: {0}")]
    BeaconExists(String),

    #[error("beacon not configured: {0}")]
    BeaconNotFound(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config_invalid(beacon: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            beacon: beacon.into(),
            message: message.into(),
        }
    }
}
