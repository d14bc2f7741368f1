//! Minimal HTTP service whose records carry build metadata.

use axum::{Json, Router, extract::State, routing::get};
use logkit::{Engine, Format, Level, LogOption, Logger, VersionInfo, fields, version};
use serde::Serialize;

use crate::app::server;
use crate::env::port_from_env;
use crate::error::DemoError;

pub const DEFAULT_PORT: u16 = 8082;

const ENDPOINTS: [&str; 3] = ["/", "/health", "/version"];

#[derive(Clone)]
struct HttpState {
    logger: Logger,
    version: &'static VersionInfo,
}

#[derive(Debug, Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn log_option(version: &VersionInfo) -> LogOption {
    let mut option = LogOption {
        engine: Engine::Tracing,
        level: Level::Info,
        format: Format::Json,
        output_paths: vec!["stdout".to_string()],
        otlp_endpoint: "localhost:4317".to_string(),
        ..LogOption::default()
    };
    option.with_initial_fields(fields! {
        "service.name" => version.service_name,
        "service.version" => version.git_version,
        "commit" => version.short_commit(),
        "build_date" => version.build_date,
    });
    option
}

pub fn router(logger: Logger, version: &'static VersionInfo) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/version", get(version_info))
        .with_state(HttpState { logger, version })
}

async fn root(State(state): State<HttpState>) -> Json<RootResponse> {
    state.logger.info_with(
        "Handling root request",
        fields! { "endpoint" => "/", "method" => "GET" },
    );
    Json(RootResponse {
        message: "Welcome to the logkit example API",
        version: state.version.git_version,
    })
}

async fn health(State(state): State<HttpState>) -> Json<HealthResponse> {
    state.logger.info_with(
        "Health check requested",
        fields! { "endpoint" => "/health", "method" => "GET" },
    );
    Json(HealthResponse {
        status: "healthy",
        version: state.version.git_version,
    })
}

async fn version_info(State(state): State<HttpState>) -> Json<&'static VersionInfo> {
    state.logger.info_with(
        "Version info requested",
        fields! { "endpoint" => "/version", "method" => "GET" },
    );
    Json(state.version)
}

pub async fn run() -> Result<(), DemoError> {
    let version = version::get();
    let option = log_option(version);
    let logger = Logger::new(&option)?;

    if option.is_otlp_enabled() {
        println!(
            "OTLP configured for endpoint: {} (connection may fail if collector is not running)",
            option.resolved_otlp_endpoint()
        );
    }

    let port = port_from_env(DEFAULT_PORT);
    logger.info_with(
        "Starting server",
        fields! {
            "port" => port,
            "endpoints" => ENDPOINTS,
            "rust_version" => version.rust_version,
            "platform" => version.platform,
        },
    );

    let result = server::serve(router(logger.clone(), version), port).await;
    if let Err(e) = &result {
        logger.error_with("Failed to start server", fields! { "error" => e.to_string() });
    }
    logger.flush();
    result
}
