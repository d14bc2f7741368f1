//! Logger option record.
//!
//! `LogOption` is the single value handed to [`crate::Logger::new`]. It is
//! plain data: it can be built in code, deserialized from a config file, or
//! serialized back out for diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::LoggerError;
use crate::fields::Fields;
use crate::level::Level;

/// Back-end that turns records into output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Records are written straight to the sinks.
    Native,
    /// Records are dispatched as `tracing` events through a per-logger subscriber.
    #[default]
    Tracing,
}

impl Engine {
    pub const ALLOWED: [&'static str; 2] = ["native", "tracing"];

    pub fn as_str(self) -> &'static str {
        match self {
            Engine::Native => "native",
            Engine::Tracing => "tracing",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Engine::Native),
            "tracing" => Ok(Engine::Tracing),
            other => Err(LoggerError::InvalidValue {
                field: "engine",
                value: other.to_string(),
                allowed: Engine::ALLOWED.join(", "),
            }),
        }
    }
}

/// Line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Console,
}

impl Format {
    pub const ALLOWED: [&'static str; 2] = ["json", "console"];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Console => "console",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "console" => Ok(Format::Console),
            other => Err(LoggerError::InvalidValue {
                field: "format",
                value: other.to_string(),
                allowed: Format::ALLOWED.join(", "),
            }),
        }
    }
}

/// Wire protocol of the OTLP collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    Http,
}

impl OtlpProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            OtlpProtocol::Grpc => "grpc",
            OtlpProtocol::Http => "http",
        }
    }
}

impl fmt::Display for OtlpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtlpProtocol {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grpc" => Ok(OtlpProtocol::Grpc),
            "http" => Ok(OtlpProtocol::Http),
            other => Err(LoggerError::InvalidValue {
                field: "otlp.protocol",
                value: other.to_string(),
                allowed: "grpc, http".to_string(),
            }),
        }
    }
}

fn default_otlp_timeout() -> u64 {
    10
}

/// Telemetry export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtlpOption {
    /// `None` means "enable when an endpoint is known".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    pub endpoint: String,
    pub protocol: OtlpProtocol,
    #[serde(default = "default_otlp_timeout")]
    pub timeout_secs: u64,
    pub headers: BTreeMap<String, String>,
}

impl Default for OtlpOption {
    fn default() -> Self {
        Self {
            enabled: None,
            endpoint: String::new(),
            protocol: OtlpProtocol::default(),
            timeout_secs: default_otlp_timeout(),
            headers: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOption {
    pub engine: Engine,
    pub level: Level,
    pub format: Format,
    pub output_paths: Vec<String>,
    pub development: bool,
    pub disable_caller: bool,
    pub disable_stacktrace: bool,
    pub initial_fields: Fields,
    pub otlp_endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otlp: Option<OtlpOption>,
}

impl Default for LogOption {
    fn default() -> Self {
        Self {
            engine: Engine::default(),
            level: Level::default(),
            format: Format::default(),
            output_paths: vec!["stdout".to_string()],
            development: false,
            disable_caller: false,
            disable_stacktrace: false,
            initial_fields: Fields::new(),
            otlp_endpoint: String::new(),
            otlp: None,
        }
    }
}

impl LogOption {
    /// Merge `fields` into the initial fields. Later keys replace earlier ones.
    pub fn with_initial_fields(&mut self, fields: Fields) -> &mut Self {
        for (key, value) in fields {
            self.initial_fields.insert(key, value);
        }
        self
    }

    pub fn add_initial_field<V: Serialize>(&mut self, key: impl Into<String>, value: V) -> &mut Self {
        self.initial_fields
            .insert(key.into(), crate::fields::to_value(value));
        self
    }

    /// Nested endpoint wins over the shorthand `otlp_endpoint`.
    pub fn resolved_otlp_endpoint(&self) -> &str {
        match &self.otlp {
            Some(otlp) if !otlp.endpoint.trim().is_empty() => otlp.endpoint.as_str(),
            _ => self.otlp_endpoint.as_str(),
        }
    }

    pub fn is_otlp_enabled(&self) -> bool {
        let has_endpoint = !self.resolved_otlp_endpoint().trim().is_empty();
        match self.otlp.as_ref().and_then(|otlp| otlp.enabled) {
            Some(false) => false,
            Some(true) | None => has_endpoint,
        }
    }

    pub fn validate(&self) -> Result<(), LoggerError> {
        if !self.output_paths.iter().any(|path| !path.trim().is_empty()) {
            return Err(LoggerError::InvalidOption(
                "output_paths must contain at least one destination".to_string(),
            ));
        }

        if let Some(otlp) = &self.otlp
            && otlp.enabled == Some(true)
            && self.resolved_otlp_endpoint().trim().is_empty()
        {
            return Err(LoggerError::InvalidOption(
                "otlp is enabled but no endpoint is configured".to_string(),
            ));
        }

        Ok(())
    }
}
