//! HTTP service whose logger is built entirely from a YAML file plus
//! `APP_*` environment overrides.

use std::path::Path;
use std::sync::Arc;

use axum::{Json, Router, extract::State, middleware, response::IntoResponse, routing::get};
use clap::Parser;
use logkit::{LogOption, Logger, VersionInfo, fields};
use serde_json::{Value, json};

use crate::app::server;
use crate::config::{AppConfig, ConfigError, load_config_from_file, relevant_env_vars, sanitize_config};
use crate::error::DemoError;
use crate::middleware::{RequestLog, request_logging};

const ENDPOINTS: [&str; 5] = ["/", "/health", "/version", "/config", "/logger/test"];

#[derive(Parser, Debug, Clone)]
#[command(name = "config-demo", author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to load, e.g. `production.yaml` or `config/testing.yaml`
    pub config_file: Option<String>,

    /// Environment whose `<env>.yaml` is loaded when no file is given
    #[arg(long, env = "APP_ENV", default_value = "app")]
    pub env: String,
}

impl Cli {
    pub fn config_file(&self) -> String {
        self.config_file
            .clone()
            .unwrap_or_else(|| format!("{}.yaml", self.env))
    }
}

#[derive(Clone)]
struct ConfigState {
    logger: Logger,
    config: Arc<AppConfig>,
    config_file: Arc<str>,
    version: &'static VersionInfo,
}

/// Service name and version, preferring values stamped into the build.
fn service_identity<'a>(config: &'a AppConfig, version: &'a VersionInfo) -> (&'a str, &'a str) {
    let name = if version.service_name.is_empty() {
        config.service.name.as_str()
    } else {
        version.service_name
    };
    let service_version = if version.is_default_version() {
        config.service.version.as_str()
    } else {
        version.git_version
    };
    (name, service_version)
}

/// The option used to build the service logger: the configured one plus
/// service identity and deployment fields.
pub fn service_log_option(
    config: &AppConfig,
    option: &LogOption,
    config_file: &str,
    version: &VersionInfo,
) -> LogOption {
    let (name, service_version) = service_identity(config, version);
    let mut option = option.clone();
    option
        .with_initial_fields(fields! {
            "service.name" => name,
            "service.version" => service_version,
            "config_file" => config_file,
            "environment" => &config.server.environment,
        })
        .add_initial_field("commit", version.short_commit())
        .add_initial_field("build_date", version.build_date);
    option
}

/// Logger option without secrets, plus the build identity.
pub fn sanitize_log_option(option: &LogOption, version: &VersionInfo) -> Value {
    json!({
        "engine": option.engine,
        "level": option.level,
        "format": option.format,
        "development": option.development,
        "disable_caller": option.disable_caller,
        "disable_stacktrace": option.disable_stacktrace,
        "output_paths": option.output_paths,
        "otlp_enabled": option.is_otlp_enabled(),
        "otlp_endpoint": option.resolved_otlp_endpoint(),
        "service_name": version.service_name,
        "service_version": version.git_version,
    })
}

pub fn router(
    logger: Logger,
    config: AppConfig,
    config_file: &str,
    version: &'static VersionInfo,
) -> Router {
    let development = config.is_development();
    let state = ConfigState {
        logger: logger.clone(),
        config: Arc::new(config),
        config_file: Arc::from(config_file),
        version,
    };

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/version", get(version_info))
        .route("/config", get(config_info))
        .route("/logger/test", get(logger_test));
    if development {
        router = router.route("/debug/config", get(debug_config));
    }

    router
        .layer(middleware::from_fn_with_state(
            RequestLog::new(logger, "HTTP request processed"),
            request_logging,
        ))
        .with_state(state)
}

async fn root(State(state): State<ConfigState>) -> impl IntoResponse {
    state.logger.info_with(
        "Handling root request",
        fields! { "endpoint" => "/", "method" => "GET" },
    );
    Json(json!({
        "message": "Configuration Demo API",
        "service": state.config.service.name,
        "version": state.config.service.version,
        "environment": state.config.server.environment,
        "config_file": &*state.config_file,
        "description": state.config.service.description,
    }))
}

async fn health(State(state): State<ConfigState>) -> impl IntoResponse {
    state
        .logger
        .debug_with("Health check requested", fields! { "endpoint" => "/health" });
    Json(json!({
        "status": "healthy",
        "service": state.config.service.name,
        "version": state.config.service.version,
        "environment": state.config.server.environment,
        "uptime": "running",
    }))
}

async fn version_info(State(state): State<ConfigState>) -> impl IntoResponse {
    state.logger.info_with(
        "Version info requested",
        fields! { "endpoint" => "/version", "method" => "GET" },
    );
    Json(json!({
        "build_info": state.version,
        "config_info": state.config.service,
        "server_info": state.config.server,
    }))
}

async fn config_info(State(state): State<ConfigState>) -> impl IntoResponse {
    state
        .logger
        .info_with("Configuration info requested", fields! { "endpoint" => "/config" });
    Json(json!({
        "config": sanitize_config(&state.config),
        "loaded_from": &*state.config_file,
    }))
}

async fn logger_test(State(state): State<ConfigState>) -> impl IntoResponse {
    let logger = &state.logger;
    logger.info_with("Logger test endpoint accessed", fields! { "endpoint" => "/logger/test" });

    logger.debug("This is a debug message");
    logger.info("This is an info message");
    logger.warn("This is a warning message");
    logger.error("This is an error message (simulated)");

    logger.info_with(
        "Structured logging test",
        fields! {
            "user_id" => "12345",
            "action" => "test_logging",
            "timestamp" => "2025-09-01T15:00:00Z",
            "success" => true,
        },
    );

    Json(json!({
        "message": "Logger test completed",
        "levels_tested": ["debug", "info", "warn", "error"],
        "check": "See logs for output",
    }))
}

async fn debug_config(State(state): State<ConfigState>) -> impl IntoResponse {
    state
        .logger
        .debug_with("Debug config endpoint accessed", fields! { "endpoint" => "/debug/config" });
    Json(json!({
        "raw_config": sanitize_config(&state.config),
        "log_option": sanitize_log_option(&state.config.logger, state.version),
        "env_vars": relevant_env_vars(),
    }))
}

fn print_summary(config: &AppConfig, option: &LogOption, version: &VersionInfo) {
    println!("Configuration loaded successfully");
    println!("   Engine: {}", option.engine);
    println!("   Level: {}", option.level);
    println!("   Format: {}", option.format);
    println!("   Output Paths: {:?}", option.output_paths);

    let (name, service_version) = service_identity(config, version);
    println!("   Service: {name} {service_version}");

    if option.is_otlp_enabled() {
        let protocol = option.otlp.as_ref().map(|otlp| otlp.protocol).unwrap_or_default();
        println!("   OTLP: {} ({protocol})", option.resolved_otlp_endpoint());
    } else {
        println!("   OTLP: disabled");
    }
    println!();
}

/// Help printed when the config file cannot be loaded. Bare file names are
/// resolved against `./config`, so the shipped files are listed by full path.
fn load_failure_hint() -> String {
    let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
    let mut hint = String::from("Available config files:\n");
    for (name, note) in [
        ("app.yaml", " (development)"),
        ("production.yaml", ""),
        ("testing.yaml", ""),
    ] {
        hint.push_str(&format!("  - {}{note}\n", shipped.join(name).display()));
    }
    hint.push_str(&format!(
        "\nBare names are looked up in ./config; run from {} or pass a path.\n",
        env!("CARGO_MANIFEST_DIR")
    ));
    hint.push_str("\nUsage: config-demo [config-file]\n");
    hint.push_str("   or: APP_ENV=production config-demo");
    hint
}

fn print_load_failure(err: &ConfigError) {
    eprintln!("Failed to load configuration: {err}");
    eprintln!("{}", load_failure_hint());
}

pub async fn run(cli: Cli) -> Result<(), DemoError> {
    println!("=== Configuration Demo ===");
    let config_file = cli.config_file();
    println!("Loading config from: {config_file}\n");

    let (config, option) = load_config_from_file(&config_file).inspect_err(print_load_failure)?;

    let version = logkit::version::get();
    print_summary(&config, &option, version);

    let option = service_log_option(&config, &option, &config_file, version);
    let logger = Logger::new(&option)?;

    logger.info_with(
        "Application starting",
        fields! {
            "config_loaded" => true,
            "server_port" => config.server.port,
            "logger_engine" => option.engine,
            "otlp_enabled" => option.is_otlp_enabled(),
        },
    );

    let port = config.server.port;
    logger.info_with(
        "Starting server",
        fields! {
            "port" => port,
            "environment" => &config.server.environment,
            "endpoints" => ENDPOINTS,
            "logger_config" => format!("{}/{}/{}", option.engine, option.level, option.format),
        },
    );

    let result = server::serve(router(logger.clone(), config, &config_file, version), port).await;
    if let Err(e) = &result {
        logger.error_with(
            "Failed to start server",
            fields! { "error" => e.to_string(), "port" => port },
        );
    }
    logger.flush();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_picks_file_argument_over_env() {
        let cli = Cli::try_parse_from(["config-demo", "production.yaml", "--env", "testing"]).unwrap();
        assert_eq!(cli.config_file(), "production.yaml");

        let cli = Cli::try_parse_from(["config-demo", "--env", "testing"]).unwrap();
        assert_eq!(cli.config_file(), "testing.yaml");
    }

    #[test]
    fn test_cli_defaults_to_app_yaml() {
        temp_env::with_var_unset("APP_ENV", || {
            let cli = Cli::try_parse_from(["config-demo"]).unwrap();
            assert_eq!(cli.config_file(), "app.yaml");
        });
    }

    #[test]
    fn test_load_failure_hint_lists_shipped_files() {
        let hint = load_failure_hint();
        let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("config");
        for name in ["app.yaml", "production.yaml", "testing.yaml"] {
            let path = shipped.join(name);
            assert!(path.is_file(), "{} missing", path.display());
            assert!(hint.contains(&path.display().to_string()));
        }
        assert!(hint.contains("APP_ENV=production"));
    }

    #[test]
    fn test_sanitize_log_option_reports_otlp() {
        let option = LogOption {
            otlp_endpoint: "otel:4317".to_string(),
            ..LogOption::default()
        };
        let value = sanitize_log_option(&option, logkit::version::get());
        assert_eq!(value["otlp_enabled"], true);
        assert_eq!(value["otlp_endpoint"], "otel:4317");
        assert_eq!(value["engine"], "tracing");
    }
}
