use std::collections::BTreeMap;
use std::str::FromStr;

use logkit::{Engine, Fields, Format, Level, LogOption, LoggerError, OtlpOption, OtlpProtocol};
use serde::Deserialize;

use super::serde_helpers;
use super::{AppConfig, ConfigError, ServerConfig, ServiceConfig};

/// Configuration as read from the layered value tree, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub server: RawServer,
    pub service: RawService,
    pub logger: RawLogger,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawServer {
    pub port: i64,
    #[serde(deserialize_with = "serde_helpers::string")]
    pub name: String,
    #[serde(deserialize_with = "serde_helpers::string")]
    pub environment: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawService {
    #[serde(deserialize_with = "serde_helpers::string")]
    pub name: String,
    #[serde(deserialize_with = "serde_helpers::string")]
    pub version: String,
    #[serde(deserialize_with = "serde_helpers::string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawLogger {
    #[serde(deserialize_with = "serde_helpers::optional_string")]
    pub engine: Option<String>,
    #[serde(deserialize_with = "serde_helpers::optional_string")]
    pub level: Option<String>,
    #[serde(deserialize_with = "serde_helpers::optional_string")]
    pub format: Option<String>,
    #[serde(deserialize_with = "serde_helpers::string_list")]
    pub output_paths: Vec<String>,
    pub development: bool,
    pub disable_caller: bool,
    pub disable_stacktrace: bool,
    pub initial_fields: Fields,
    #[serde(deserialize_with = "serde_helpers::string")]
    pub otlp_endpoint: String,
    pub otlp: Option<RawOtlp>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawOtlp {
    pub enabled: Option<bool>,
    #[serde(deserialize_with = "serde_helpers::string")]
    pub endpoint: String,
    #[serde(deserialize_with = "serde_helpers::optional_string")]
    pub protocol: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(deserialize_with = "serde_helpers::string_map")]
    pub headers: BTreeMap<String, String>,
}

/// Validate `raw` and convert it into an [`AppConfig`].
pub fn validate(raw: RawConfig) -> Result<AppConfig, ConfigError> {
    let port = validate_port(raw.server.port)?;

    let logger = raw.logger;
    let engine: Engine = required("logger.engine", logger.engine.as_deref(), &Engine::ALLOWED)?;
    let level: Level = required("logger.level", logger.level.as_deref(), &Level::ALLOWED)?;
    let format: Format = required("logger.format", logger.format.as_deref(), &Format::ALLOWED)?;

    let otlp = logger.otlp.map(validate_otlp).transpose()?;

    let option = LogOption {
        engine,
        level,
        format,
        output_paths: if logger.output_paths.is_empty() {
            LogOption::default().output_paths
        } else {
            logger.output_paths
        },
        development: logger.development,
        disable_caller: logger.disable_caller,
        disable_stacktrace: logger.disable_stacktrace,
        initial_fields: logger.initial_fields,
        otlp_endpoint: logger.otlp_endpoint,
        otlp,
    };
    option.validate().map_err(invalid)?;

    Ok(AppConfig {
        server: ServerConfig {
            port,
            name: raw.server.name,
            environment: raw.server.environment,
        },
        service: ServiceConfig {
            name: raw.service.name,
            version: raw.service.version,
            description: raw.service.description,
        },
        logger: option,
    })
}

fn validate_otlp(raw: RawOtlp) -> Result<OtlpOption, ConfigError> {
    let defaults = OtlpOption::default();
    let protocol = match raw.protocol.as_deref().map(str::trim) {
        None | Some("") => OtlpProtocol::default(),
        Some(value) => value.parse().map_err(invalid)?,
    };
    Ok(OtlpOption {
        enabled: raw.enabled,
        endpoint: raw.endpoint,
        protocol,
        timeout_secs: raw.timeout_secs.unwrap_or(defaults.timeout_secs),
        headers: raw.headers,
    })
}

/// Validates that the port is in valid range (1-65535).
fn validate_port(port: i64) -> Result<u16, ConfigError> {
    u16::try_from(port)
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ConfigError::Invalid(format!("invalid server port: {port}")))
}

fn required<T>(key: &str, value: Option<&str>, allowed: &[&str]) -> Result<T, ConfigError>
where
    T: FromStr<Err = LoggerError>,
{
    match value.map(str::trim) {
        None | Some("") => Err(ConfigError::Invalid(format!(
            "{key} is required (must be one of: {})",
            allowed.join(", ")
        ))),
        Some(value) => value.parse().map_err(invalid),
    }
}

fn invalid(err: LoggerError) -> ConfigError {
    ConfigError::Invalid(err.to_string())
}
