//! A logger with many typed initial fields; every record repeats all of them.

use logkit::{Engine, Format, Level, LogOption, Logger, VersionInfo, fields};
use serde_json::json;

use crate::env::env_or_default;
use crate::error::DemoError;

pub fn log_option(version: &VersionInfo, output_paths: &[String]) -> LogOption {
    let mut option = LogOption {
        engine: Engine::Tracing,
        level: Level::Info,
        format: Format::Json,
        output_paths: output_paths.to_vec(),
        ..LogOption::default()
    };
    option.with_initial_fields(fields! {
        "service.name" => version.service_name,
        "service.version" => version.git_version,
        "environment" => "production",
        "region" => "us-west-2",
        "datacenter" => "dc-1",
        "team" => "platform",
        "squad" => "infrastructure",
        "maintainer" => "john.doe@company.com",
        "language" => "rust",
        "framework" => "axum",
        "port" => 8080,
        "app_type" => "web-api",
        "health_check" => true,
        "debug_mode" => false,
        "cost_center" => "engineering",
        "project" => "customer-portal",
        "container_id" => env_or_default("CONTAINER_ID", "container-abc123"),
        "node_name" => env_or_default("NODE_NAME", "node-worker-01"),
        "data_classification" => "internal",
        "retention_days" => 30,
    });
    option
}

pub fn run(version: &VersionInfo, output_paths: &[String]) -> Result<(), DemoError> {
    println!("=== Custom Initial Fields Demo ===");
    println!("Demonstrating how all initial fields are included in every log entry\n");

    let logger = Logger::new(&log_option(version, output_paths))?;

    println!("1. Simple info log:");
    logger.info("Application started successfully");

    println!("\n2. Structured log with additional fields:");
    logger.info_with(
        "User login",
        fields! {
            "user_id" => "user-12345",
            "ip_address" => "192.168.1.100",
            "login_method" => "oauth2",
        },
    );

    println!("\n3. Error log:");
    logger.error_with(
        "Database connection failed",
        fields! {
            "error" => "connection timeout",
            "retry_count" => 3,
            "duration_ms" => 5000,
        },
    );

    // Below the info threshold.
    println!("\n4. Debug log with nested data:");
    logger.debug_with(
        "Processing request",
        fields! {
            "request_id" => "req-789",
            "user_agent" => "Mozilla/5.0...",
            "headers" => json!({
                "authorization": "Bearer ***",
                "content-type": "application/json",
            }),
        },
    );
    logger.flush();

    println!("\n=== Demo Complete ===");
    println!("Every log entry includes all the initial fields, plus any call fields.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    #[test]
    fn test_records_repeat_initial_fields_and_skip_debug() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.log");
        temp_env::with_vars_unset(["CONTAINER_ID", "NODE_NAME"], || {
            run(logkit::version::get(), &[path.display().to_string()]).unwrap();
        });

        let lines: Vec<Value> = std::fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        for line in &lines {
            assert_eq!(line["team"], "platform");
            assert_eq!(line["port"], 8080);
            assert_eq!(line["health_check"], true);
            assert_eq!(line["container_id"], "container-abc123");
        }
        assert_eq!(lines[1]["login_method"], "oauth2");
        assert_eq!(lines[2]["level"], "error");
        assert_eq!(lines[2]["retry_count"], 3);
        assert!(lines[2]["stacktrace"].is_string());
    }
}
