use std::path::{Path, PathBuf};

use logkit::{Engine, Format, Level, LogOption, Logger, fields};
use serde_json::{Value, json};
use tempfile::TempDir;

fn option_for(path: &Path, engine: Engine) -> LogOption {
    LogOption {
        engine,
        output_paths: vec![path.display().to_string()],
        ..LogOption::default()
    }
}

fn read_json_lines(path: &Path) -> Vec<Value> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn log_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

#[test]
fn test_default_fields_are_unknown_for_both_engines() {
    let dir = TempDir::new().unwrap();
    for engine in [Engine::Native, Engine::Tracing] {
        let path = log_path(&dir, &format!("{engine}.log"));
        let logger = Logger::new(&option_for(&path, engine)).unwrap();
        logger.info("Logger started with default fields");
        logger.flush();

        let lines = read_json_lines(&path);
        assert_eq!(lines.len(), 1, "engine {engine}");
        assert_eq!(lines[0]["service.name"], json!("unknown"));
        assert_eq!(lines[0]["service.version"], json!("unknown"));
        assert_eq!(lines[0]["level"], json!("info"));
    }
}

#[test]
fn test_engines_write_identical_shapes() {
    let dir = TempDir::new().unwrap();
    let mut keys = Vec::new();
    for engine in [Engine::Native, Engine::Tracing] {
        let path = log_path(&dir, &format!("shape-{engine}.log"));
        let mut option = option_for(&path, engine);
        option
            .add_initial_field("service.name", "payment-service")
            .add_initial_field("service.version", "v2.3.1")
            .add_initial_field("team", "platform");
        let logger = Logger::new(&option).unwrap();
        logger.warn_with("High memory usage", fields! { "memory_usage" => "85%" });

        let lines = read_json_lines(&path);
        let line = lines[0].as_object().unwrap();
        let mut names: Vec<_> = line.keys().cloned().collect();
        names.retain(|name| name != "caller");
        keys.push(names);
        assert_eq!(line["memory_usage"], json!("85%"));
        assert_eq!(line["team"], json!("platform"));
    }
    assert_eq!(keys[0], keys[1]);
}

#[test]
fn test_level_threshold_filters_records() {
    let dir = TempDir::new().unwrap();
    let path = log_path(&dir, "levels.log");
    let option = LogOption {
        level: Level::Warn,
        ..option_for(&path, Engine::Tracing)
    };
    let logger = Logger::new(&option).unwrap();
    assert!(!logger.enabled(Level::Info));
    assert!(logger.enabled(Level::Error));

    logger.debug("debug");
    logger.info("info");
    logger.warn("warn");
    logger.error("error");

    let messages: Vec<_> = read_json_lines(&path)
        .into_iter()
        .map(|line| line["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages, vec!["warn", "error"]);
}

#[test]
fn test_child_logger_adds_fields_without_touching_parent() {
    let dir = TempDir::new().unwrap();
    let path = log_path(&dir, "child.log");
    let logger = Logger::new(&option_for(&path, Engine::Native)).unwrap();
    let child = logger.with(fields! { "request_id" => "req-001" });

    child.info("from child");
    logger.info("from parent");

    let lines = read_json_lines(&path);
    assert_eq!(lines[0]["request_id"], json!("req-001"));
    assert!(lines[1].get("request_id").is_none());
    assert_eq!(child.outputs(), logger.outputs());
}

#[test]
fn test_multiple_outputs_receive_every_record() {
    let dir = TempDir::new().unwrap();
    let first = log_path(&dir, "logs/app.log");
    let second = log_path(&dir, "logs/debug/debug.log");
    let option = LogOption {
        output_paths: vec![
            first.display().to_string(),
            second.display().to_string(),
        ],
        ..LogOption::default()
    };
    let logger = Logger::new(&option).unwrap();
    logger.info("Log written to multiple outputs");
    logger.flush();

    assert_eq!(read_json_lines(&first).len(), 1);
    assert_eq!(read_json_lines(&second).len(), 1);
}

#[test]
fn test_file_output_appends_across_loggers() {
    let dir = TempDir::new().unwrap();
    let path = log_path(&dir, "append.log");
    for _ in 0..2 {
        let logger = Logger::new(&option_for(&path, Engine::Native)).unwrap();
        logger.info("appended");
    }
    assert_eq!(read_json_lines(&path).len(), 2);
}

#[test]
fn test_console_format_lines() {
    let dir = TempDir::new().unwrap();
    let path = log_path(&dir, "console.log");
    let option = LogOption {
        format: Format::Console,
        disable_caller: true,
        ..option_for(&path, Engine::Tracing)
    };
    let logger = Logger::new(&option).unwrap();
    logger.info("Console format log");

    let content = std::fs::read_to_string(&path).unwrap();
    let columns: Vec<_> = content.trim_end().split('\t').collect();
    assert_eq!(columns[1], "INFO");
    assert_eq!(columns[2], "Console format log");
    assert!(columns[3].contains("\"service.name\":\"unknown\""));
}

#[test]
fn test_unwritable_output_is_an_error() {
    let dir = TempDir::new().unwrap();
    let option = option_for(dir.path(), Engine::Native);
    let err = Logger::new(&option).unwrap_err();
    assert!(err.to_string().starts_with("failed to open output"));
}

#[test]
fn test_logger_is_shareable_across_threads() {
    let dir = TempDir::new().unwrap();
    let path = log_path(&dir, "threads.log");
    let logger = Logger::new(&option_for(&path, Engine::Tracing)).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let logger = logger.clone();
            std::thread::spawn(move || {
                for i in 0..25 {
                    logger.info_with("tick", fields! { "worker" => worker, "i" => i });
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(read_json_lines(&path).len(), 100);
}
