//! Web service whose logger carries environment, ownership and deployment
//! context in every record, with request logging middleware.

use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use logkit::{Engine, Format, Level, LogOption, Logger, VersionInfo, fields};
use serde_json::json;

use crate::app::server;
use crate::env::{env_or_default, port_from_env};
use crate::error::DemoError;
use crate::middleware::{RequestLog, request_logging};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_OUTPUTS: [&str; 2] = ["stdout", "logs/app.log"];

const KNOWN_USER: &str = "123";
const LOOKUP_DELAY: Duration = Duration::from_millis(10);

#[derive(Clone)]
struct ServiceState {
    logger: Logger,
    version: &'static VersionInfo,
}

pub fn log_option(version: &VersionInfo, output_paths: &[String]) -> LogOption {
    let mut option = LogOption {
        engine: Engine::Tracing,
        level: Level::Info,
        format: Format::Json,
        output_paths: output_paths.to_vec(),
        ..LogOption::default()
    };
    option.with_initial_fields(fields! {
        "service.name" => env_or_default("SERVICE_NAME", version.service_name),
        "service.version" => env_or_default("SERVICE_VERSION", version.git_version),
        "environment" => env_or_default("ENVIRONMENT", "development"),
        "region" => env_or_default("AWS_REGION", "us-west-2"),
        "az" => env_or_default("AWS_AZ", "us-west-2a"),
        "pod_name" => env_or_default("POD_NAME", "local-pod"),
        "node_name" => env_or_default("NODE_NAME", "local-node"),
        "namespace" => env_or_default("POD_NAMESPACE", "default"),
        "cluster" => env_or_default("CLUSTER_NAME", "local-cluster"),
        "app_name" => "customer-api",
        "app_version" => "v2.1.0",
        "rust_version" => version.rust_version,
        "build_date" => version.build_date,
        "commit" => version.short_commit(),
        "team" => "platform",
        "squad" => "api-team",
        "owner" => "platform-team@company.com",
        "on_call" => env_or_default("ONCALL_CONTACT", "platform-oncall@company.com"),
        "business_unit" => "customer-success",
        "cost_center" => "engineering",
        "project" => "customer-portal-v2",
        "server_port" => env_or_default("PORT", &DEFAULT_PORT.to_string()),
        "log_level" => "info",
        "metrics_port" => "9090",
        "health_port" => "8081",
        "data_classification" => "confidential",
        "compliance_scope" => "pci-dss",
        "retention_policy" => "90-days",
        "monitoring.team" => "platform",
        "monitoring.runbook" => "https://wiki.company.com/runbooks/customer-api",
        "monitoring.dashboard" => "https://grafana.company.com/d/customer-api",
        "monitoring.alert_level" => "critical",
        "feature.new_auth" => true,
        "feature.rate_limiting" => true,
        "feature.caching" => false,
        "max_connections" => 1000,
        "timeout_seconds" => 30,
        "workers" => 4,
    });
    option
}

pub fn router(logger: Logger, version: &'static VersionInfo) -> Router {
    let request_log = RequestLog::new(logger.clone(), "HTTP request");
    Router::new()
        .route("/", get(home))
        .route("/users/{id}", get(get_user))
        .route("/users", post(create_user))
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(request_log, request_logging))
        .with_state(ServiceState { logger, version })
}

async fn home(State(state): State<ServiceState>, headers: HeaderMap) -> impl IntoResponse {
    let referrer = headers
        .get(header::REFERER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    state.logger.info_with(
        "Homepage accessed",
        fields! { "user_type" => "anonymous", "referrer" => referrer },
    );
    Json(json!({
        "message": "Customer API",
        "version": state.version.git_version,
        "status": "healthy",
    }))
}

async fn get_user(State(state): State<ServiceState>, Path(user_id): Path<String>) -> Response {
    state.logger.info_with(
        "User lookup started",
        fields! {
            "user_id" => &user_id,
            "operation" => "get_user",
            "cache_enabled" => true,
        },
    );

    tokio::time::sleep(LOOKUP_DELAY).await;

    if user_id == KNOWN_USER {
        state.logger.info_with(
            "User found",
            fields! {
                "user_id" => &user_id,
                "user_status" => "active",
                "last_login" => "2025-09-01T10:30:00Z",
                "permission_level" => "standard",
            },
        );
        return Json(json!({
            "user_id": user_id,
            "name": "John Doe",
            "status": "active",
        }))
        .into_response();
    }

    state.logger.warn_with(
        "User not found",
        fields! {
            "user_id" => &user_id,
            "lookup_duration_ms" => LOOKUP_DELAY.as_millis() as u64,
            "searched_indexes" => ["primary", "email", "username"],
        },
    );
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "User not found", "user_id": user_id })),
    )
        .into_response()
}

async fn create_user(State(state): State<ServiceState>, headers: HeaderMap) -> impl IntoResponse {
    let request_size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);
    state.logger.info_with(
        "User creation started",
        fields! { "operation" => "create_user", "request_size_bytes" => request_size },
    );

    state.logger.error_with(
        "User creation failed",
        fields! {
            "error" => "email already exists",
            "validation_errors" => ["email", "username"],
            "retry_recommended" => true,
        },
    );
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Email already exists" })),
    )
}

async fn health(State(state): State<ServiceState>) -> impl IntoResponse {
    state.logger.debug_with(
        "Health check performed",
        fields! {
            "check_type" => "http",
            "response_time_ms" => 1,
            "dependencies" => json!({
                "database": "healthy",
                "redis": "healthy",
                "queue": "healthy",
            }),
        },
    );
    Json(json!({ "status": "healthy" }))
}

pub async fn run() -> Result<(), DemoError> {
    let version = logkit::version::get();
    let outputs: Vec<String> = DEFAULT_OUTPUTS.iter().map(|s| s.to_string()).collect();
    let logger = Logger::new(&log_option(version, &outputs))?;

    let port = port_from_env(DEFAULT_PORT);
    logger.info_with(
        "Server starting",
        fields! {
            "startup_time" => chrono::Utc::now().to_rfc3339(),
            "pid" => std::process::id(),
            "available_endpoints" => ["/", "/users/{id}", "/users", "/health"],
        },
    );

    println!("Starting server on port {port}");
    println!("Try these endpoints:");
    println!("  curl http://localhost:{port}/");
    println!("  curl http://localhost:{port}/users/123");
    println!("  curl http://localhost:{port}/users/999");
    println!("  curl -X POST http://localhost:{port}/users");
    println!("  curl http://localhost:{port}/health");

    let result = server::serve(router(logger.clone(), version), port).await;
    if let Err(e) = &result {
        logger.error_with(
            "Server failed to start",
            fields! { "error" => e.to_string(), "port" => port },
        );
    }
    logger.flush();
    result
}
