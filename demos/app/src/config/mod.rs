//! YAML + environment configuration for the config-driven demo.
//!
//! Values are layered: built-in defaults, then the YAML file, then `APP_*`
//! environment variables (`server.port` → `APP_SERVER_PORT`).

mod loader;
mod serde_helpers;
mod validation;

use std::collections::BTreeMap;
use std::path::PathBuf;

use logkit::LogOption;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use loader::{
    ConfigManager, ENV_PREFIX, env_var_name, load_config_from_env, load_config_from_file,
};
pub use validation::{RawConfig, validate};

pub const REDACTED: &str = "***REDACTED***";

const SECRET_HEADERS: [&str; 2] = ["x-api-key", "authorization"];

const RELEVANT_ENV_VARS: [&str; 6] = [
    "APP_ENV",
    "APP_SERVER_PORT",
    "APP_LOGGER_LEVEL",
    "APP_LOGGER_ENGINE",
    "APP_LOGGER_OTLP_ENABLED",
    "APP_LOGGER_OTLP_ENDPOINT",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {name} not found (searched: {})", .searched.join(", "))]
    NotFound { name: String, searched: Vec<String> },

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to unmarshal config: {0}")]
    Deserialize(#[source] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Invalid(String),

    #[error("configuration not loaded")]
    NotLoaded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub name: String,
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub service: ServiceConfig,
    pub logger: LogOption,
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.server.environment == "development"
    }
}

/// Copy of `config` with secret OTLP headers replaced by [`REDACTED`].
pub fn sanitize_config(config: &AppConfig) -> AppConfig {
    let mut sanitized = config.clone();
    if let Some(otlp) = sanitized.logger.otlp.as_mut() {
        for (name, value) in otlp.headers.iter_mut() {
            if SECRET_HEADERS
                .iter()
                .any(|secret| name.eq_ignore_ascii_case(secret))
            {
                *value = REDACTED.to_string();
            }
        }
    }
    sanitized
}

/// The configuration-related environment variables that are currently set.
pub fn relevant_env_vars() -> BTreeMap<String, String> {
    RELEVANT_ENV_VARS
        .iter()
        .filter_map(|name| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.is_empty())
                .map(|value| (name.to_string(), value))
        })
        .collect()
}
