//! File outputs: a single file, stream plus file, per-level files,
//! timestamped files and a web server split into access and application logs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
};
use logkit::{Engine, Format, Level, LogOption, Logger, VersionInfo, fields};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::app::server;
use crate::error::DemoError;
use crate::middleware::{RequestLog, request_logging};

pub const DEFAULT_PORT: u16 = 8084;
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_PAUSE: Duration = Duration::from_millis(200);
const OPERATION_PAUSE: Duration = Duration::from_millis(100);
const OPERATIONS: [&str; 5] = [
    "user_registration",
    "order_creation",
    "payment_processing",
    "inventory_update",
    "email_notification",
];

fn option(engine: Engine, level: Level, format: Format, outputs: &[&Path]) -> LogOption {
    LogOption {
        engine,
        level,
        format,
        output_paths: outputs
            .iter()
            .map(|path| path.display().to_string())
            .collect(),
        ..LogOption::default()
    }
}

fn with_stdout(path: &Path) -> LogOption {
    let mut option = option(Engine::Tracing, Level::Debug, Format::Console, &[path]);
    option.output_paths.insert(0, "stdout".to_string());
    option
}

/// `*.log` file names directly under `dir`, sorted.
pub fn list_log_files(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "log"))
        .filter_map(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        .collect();
    files.sort();
    files
}

fn tail(content: &str, max: usize) -> &str {
    if content.len() <= max {
        return content;
    }
    let mut start = content.len() - max;
    while !content.is_char_boundary(start) {
        start += 1;
    }
    &content[start..]
}

pub struct FileLoggingDemo {
    logs_dir: PathBuf,
    version: &'static VersionInfo,
}

impl FileLoggingDemo {
    pub fn new(logs_dir: impl Into<PathBuf>, version: &'static VersionInfo) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            version,
        }
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    fn service_fields(&self) -> logkit::Fields {
        fields! {
            "service.name" => self.version.service_name,
            "service.version" => self.version.git_version,
        }
    }

    /// Four records of increasing severity to one file.
    pub fn single_file(&self) -> Result<PathBuf, DemoError> {
        let path = self.logs_dir.join("single.log");
        let mut option = option(Engine::Tracing, Level::Info, Format::Json, &[&path]);
        option.with_initial_fields(self.service_fields());
        let logger = Logger::new(&option)?;

        logger.info("Single file logging demo started");
        logger.info_with("User login", fields! { "user_id" => "12345", "ip" => "192.168.1.100" });
        logger.warn_with("High memory usage", fields! { "usage" => "85%", "threshold" => "80%" });
        logger.error_with(
            "Database connection failed",
            fields! { "error" => "connection timeout", "retry_count" => 3 },
        );
        logger.flush();

        println!("Logs written to: {}", path.display());
        if let Ok(content) = std::fs::read_to_string(&path) {
            println!("File contents (last 200 chars):\n...{}", tail(&content, 200));
        }
        Ok(path)
    }

    /// Console to stdout and a file, through child loggers.
    pub fn multiple_outputs(&self) -> Result<PathBuf, DemoError> {
        let path = self.logs_dir.join("multiple.log");
        let core = Logger::new(&with_stdout(&path))?;
        let logger = core.with(self.service_fields());
        let service_logger = logger.with(fields! {
            "component" => "payment-service",
            "environment" => "production",
        });

        println!("Watch the console output while logs are also written to file:");
        service_logger.debug("Payment processing started");
        service_logger.info("Payment validation successful");
        service_logger.warn("Payment amount exceeds daily limit");
        service_logger.error("Payment gateway error");
        service_logger.flush();

        println!("Logs written to both console and: {}", path.display());
        Ok(path)
    }

    /// One logger at info and one at error, each with its own file.
    pub fn level_based(&self) -> Result<(PathBuf, PathBuf), DemoError> {
        let info_path = self.logs_dir.join("info.log");
        let error_path = self.logs_dir.join("error.log");

        let info_logger = Logger::new(&option(Engine::Native, Level::Info, Format::Json, &[&info_path]))?
            .with(self.service_fields());
        let error_logger =
            Logger::new(&option(Engine::Native, Level::Error, Format::Json, &[&error_path]))?
                .with(self.service_fields());

        info_logger.info("Application started successfully");
        info_logger.warn("Configuration file not found, using defaults");
        info_logger.error("Failed to connect to database");

        error_logger.info("Dropped below the error threshold");
        error_logger.error("Critical system error");
        // fatal() would end the process here.
        error_logger.error("System shutdown due to critical error (simulated fatal)");

        info_logger.flush();
        error_logger.flush();
        println!("Info logs written to: {}", info_path.display());
        println!("Error logs written to: {}", error_path.display());
        Ok((info_path, error_path))
    }

    /// A file named after the current time, standing in for rotation.
    pub async fn timestamped(&self) -> Result<PathBuf, DemoError> {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
        let path = self.logs_dir.join(format!("rotated-{stamp}.log"));
        let logger = Logger::new(&option(Engine::Native, Level::Info, Format::Json, &[&path]))?
            .with(self.service_fields());

        for (step, operation) in OPERATIONS.iter().enumerate() {
            logger.info_with(
                "Business operation",
                fields! {
                    "operation" => operation,
                    "step" => step + 1,
                    "timestamp" => chrono::Utc::now().timestamp(),
                },
            );
            tokio::time::sleep(OPERATION_PAUSE).await;
        }
        logger.flush();

        println!("Timestamped logs written to: {}", path.display());
        Ok(path)
    }

    /// Serve on `port`, send a few requests to ourselves, then shut down.
    /// Returns the status code seen for each request.
    pub async fn web_server(&self, port: u16) -> Result<Vec<(String, u16)>, DemoError> {
        let access_path = self.logs_dir.join("access.log");
        let app_path = self.logs_dir.join("application.log");

        let access_logger = Logger::new(&option(Engine::Tracing, Level::Info, Format::Json, &[&access_path]))?
            .with(self.service_fields())
            .with(fields! { "component" => "http-access" });
        let app_logger = Logger::new(&with_stdout(&app_path))?
            .with(self.service_fields())
            .with(fields! { "component" => "application" });

        let files = LogFiles {
            logs_dir: self.logs_dir.clone(),
            access: access_path.display().to_string(),
            app: app_path.display().to_string(),
        };
        let app = router(access_logger, app_logger.clone(), files, self.version);

        let listener = server::bind(port).await?;
        let port = listener.local_addr()?.port();
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(server::serve_until(listener, app, shutdown.clone()));
        app_logger.info_with(
            "Starting web server",
            fields! {
                "port" => port,
                "access_log" => access_path.display().to_string(),
                "app_log" => app_path.display().to_string(),
            },
        );

        println!("Web server started on http://localhost:{port}");
        println!("Making some test requests...");
        let statuses = self_requests(&app_logger, port).await;

        println!("\nShutting down server...");
        shutdown.cancel();
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, handle).await {
            Ok(Ok(Ok(()))) => app_logger.info("Server shutdown completed"),
            Ok(Ok(Err(e))) => {
                app_logger.error_with("Server shutdown failed", fields! { "error" => e.to_string() })
            }
            Ok(Err(e)) => {
                app_logger.error_with("Server task failed", fields! { "error" => e.to_string() })
            }
            Err(_) => app_logger.error_with(
                "Server shutdown timed out",
                fields! { "timeout_secs" => SHUTDOWN_TIMEOUT.as_secs() },
            ),
        }
        app_logger.flush();
        Ok(statuses)
    }

    pub async fn run(&self, port: u16) -> Result<(), DemoError> {
        println!("=== File Logging Demo ===");
        println!("Service: {}", self.version.service_name);
        println!("Version: {}", self.version.git_version);
        println!("Build Date: {}\n", self.version.build_date);

        std::fs::create_dir_all(&self.logs_dir)?;

        println!("=== Demo 1: Single File Logging ===");
        self.single_file()?;
        println!("\n=== Demo 2: Multiple Output Paths ===");
        self.multiple_outputs()?;
        println!("\n=== Demo 3: Level-based File Logging ===");
        self.level_based()?;
        println!("\n=== Demo 4: Timestamped File Logging ===");
        self.timestamped().await?;
        println!("\n=== Demo 5: Web Server with File Logging ===");
        self.web_server(port).await?;

        println!(
            "Demo completed. Check log files in the '{}' directory",
            self.logs_dir.display()
        );
        Ok(())
    }
}

async fn self_requests(logger: &Logger, port: u16) -> Vec<(String, u16)> {
    let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
        Ok(client) => client,
        Err(e) => {
            logger.warn_with("Failed to build HTTP client", fields! { "error" => e.to_string() });
            return Vec::new();
        }
    };

    let mut statuses = Vec::new();
    for (index, path) in ["/", "/health", "/logs", "/error"].iter().enumerate() {
        let endpoint = format!("http://127.0.0.1:{port}{path}");
        logger.debug_with(
            "Making test request",
            fields! { "endpoint" => &endpoint, "request" => index + 1 },
        );
        match client.get(&endpoint).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                logger.info_with(
                    "Test request completed",
                    fields! { "endpoint" => &endpoint, "status" => status },
                );
                statuses.push((path.to_string(), status));
            }
            Err(e) => logger.warn_with(
                "Test request failed",
                fields! { "endpoint" => &endpoint, "error" => e.to_string() },
            ),
        }
        tokio::time::sleep(REQUEST_PAUSE).await;
    }
    statuses
}

#[derive(Clone)]
struct LogFiles {
    logs_dir: PathBuf,
    access: String,
    app: String,
}

#[derive(Clone)]
struct WebState {
    logger: Logger,
    files: LogFiles,
    version: &'static VersionInfo,
}

fn router(
    access_logger: Logger,
    app_logger: Logger,
    files: LogFiles,
    version: &'static VersionInfo,
) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/error", get(simulated_error))
        .route("/logs", get(log_files))
        .layer(middleware::from_fn_with_state(
            RequestLog::new(access_logger, "HTTP request"),
            request_logging,
        ))
        .with_state(WebState {
            logger: app_logger,
            files,
            version,
        })
}

async fn root(State(state): State<WebState>) -> impl IntoResponse {
    state.logger.debug("Handling root request");
    Json(json!({
        "message": "File Logging Demo API",
        "version": state.version.git_version,
        "logs": { "access": state.files.access, "app": state.files.app },
    }))
}

async fn health(State(state): State<WebState>) -> impl IntoResponse {
    state.logger.debug("Health check requested");
    Json(json!({ "status": "healthy" }))
}

async fn simulated_error(State(state): State<WebState>) -> impl IntoResponse {
    state.logger.error("Simulated error endpoint accessed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Simulated error" })),
    )
}

async fn log_files(State(state): State<WebState>) -> impl IntoResponse {
    state.logger.debug("Log files listing requested");
    Json(json!({
        "log_files": list_log_files(&state.files.logs_dir),
        "logs_dir": format!("{}/", state.files.logs_dir.display()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_respects_char_boundaries() {
        assert_eq!(tail("short", 200), "short");
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("aé", 1), "");
    }

    #[test]
    fn test_list_log_files_ignores_other_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.log"), "").unwrap();
        std::fs::write(dir.path().join("a.log"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested.log")).unwrap();
        assert_eq!(list_log_files(dir.path()), vec!["a.log", "b.log"]);
        assert!(list_log_files(&dir.path().join("missing")).is_empty());
    }
}
