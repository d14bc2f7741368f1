use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::{Value, json};
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::{Context, SubscriberExt};

use super::Backend;
use crate::fields::Fields;
use crate::level::Level;
use crate::record::Record;
use crate::sink::{self, Sinks, WriteFailure};

const TARGET: &str = "logkit";

/// Routes records through a private `tracing` subscriber.
///
/// The dispatcher is scoped to this logger with `with_default`, so several
/// loggers with different outputs and levels can live in one process next to
/// whatever global subscriber the application installed.
pub(crate) struct TracingBackend {
    dispatch: Dispatch,
    sinks: Arc<Sinks>,
    failures: Arc<Mutex<Vec<WriteFailure>>>,
}

impl TracingBackend {
    pub(crate) fn new(sinks: Arc<Sinks>, level: Level) -> Self {
        let failures = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry()
            .with(LevelFilter::from_level(level.into()))
            .with(RecordLayer {
                sinks: Arc::clone(&sinks),
                failures: Arc::clone(&failures),
            });
        Self {
            dispatch: Dispatch::new(subscriber),
            sinks,
            failures,
        }
    }
}

// Callsites are static, so each level needs its own expansion.
macro_rules! dispatch_event {
    ($level:expr, $record:ident, $payload:ident, $caller:ident, $stacktrace:ident, $fatal:ident) => {
        tracing::event!(
            target: TARGET,
            $level,
            logkit.ts = $record.timestamp.timestamp_micros(),
            logkit.caller = $caller,
            logkit.fields = $payload.as_str(),
            logkit.stacktrace = $stacktrace,
            logkit.fatal = $fatal,
            "{}",
            $record.message
        )
    };
}

impl Backend for TracingBackend {
    fn emit(&self, record: Record) {
        let payload = Value::Object(record.fields.clone()).to_string();
        let caller = record.caller.as_deref().unwrap_or("");
        let stacktrace = record.stacktrace.as_deref().unwrap_or("");
        let fatal = record.level == Level::Fatal;

        tracing::dispatcher::with_default(&self.dispatch, || match record.level {
            Level::Debug => dispatch_event!(tracing::Level::DEBUG, record, payload, caller, stacktrace, fatal),
            Level::Info => dispatch_event!(tracing::Level::INFO, record, payload, caller, stacktrace, fatal),
            Level::Warn => dispatch_event!(tracing::Level::WARN, record, payload, caller, stacktrace, fatal),
            Level::Error | Level::Fatal => {
                dispatch_event!(tracing::Level::ERROR, record, payload, caller, stacktrace, fatal)
            }
        });

        // Reported out here: inside the dispatcher they would be dropped.
        let failures = {
            let mut pending = self.failures.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *pending)
        };
        sink::report(failures);
    }

    fn flush(&self) {
        self.sinks.flush();
    }
}

/// Rebuilds a [`Record`] from a `tracing` event and writes it to the sinks.
///
/// Events that did not come from a logger (no `logkit.*` fields) are still
/// written; their fields are kept as-is.
pub(crate) struct RecordLayer {
    sinks: Arc<Sinks>,
    failures: Arc<Mutex<Vec<WriteFailure>>>,
}

#[derive(Default)]
struct RecordVisitor {
    message: String,
    timestamp: Option<DateTime<Utc>>,
    caller: Option<String>,
    stacktrace: Option<String>,
    fatal: bool,
    fields: Fields,
}

impl RecordVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.insert(field, json!(format!("{value:?}")));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "logkit.caller" => {
                if !value.is_empty() {
                    self.caller = Some(value.to_string());
                }
            }
            "logkit.stacktrace" => {
                if !value.is_empty() {
                    self.stacktrace = Some(value.to_string());
                }
            }
            "logkit.fields" => match serde_json::from_str::<Fields>(value) {
                Ok(fields) => self.fields.extend(fields),
                Err(_) => self.insert(field, json!(value)),
            },
            _ => self.insert(field, json!(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        if field.name() == "logkit.ts" {
            self.timestamp = DateTime::from_timestamp_micros(value);
        } else {
            self.insert(field, json!(value));
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        if field.name() == "logkit.fatal" {
            self.fatal = value;
        } else {
            self.insert(field, json!(value));
        }
    }
}

fn level_of(level: &tracing::Level, fatal: bool) -> Level {
    if fatal {
        return Level::Fatal;
    }
    match *level {
        tracing::Level::ERROR => Level::Error,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::INFO => Level::Info,
        _ => Level::Debug,
    }
}

impl<S: Subscriber> Layer<S> for RecordLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let record = Record {
            timestamp: visitor.timestamp.unwrap_or_else(Utc::now),
            level: level_of(event.metadata().level(), visitor.fatal),
            message: visitor.message,
            caller: visitor.caller,
            fields: visitor.fields,
            stacktrace: visitor.stacktrace,
        };
        let failed = self.sinks.write(&record);
        if !failed.is_empty() {
            self.failures
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .extend(failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::Format;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    fn read_lines(path: &std::path::Path) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn test_record_survives_the_dispatch_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dispatch.log");
        let sinks = Arc::new(Sinks::open(&[path.display().to_string()], Format::Json).unwrap());
        let backend = TracingBackend::new(sinks, Level::Debug);

        let mut record = Record::new(
            Level::Fatal,
            "System shutdown",
            crate::fields! { "retry_count" => 3, "nested" => json!({ "a": [1, 2] }) },
        );
        record.caller = Some("src/main.rs:7".to_string());
        let expected_ts = record.timestamp;
        backend.emit(record);

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line["level"], json!("fatal"));
        assert_eq!(line["message"], json!("System shutdown"));
        assert_eq!(line["caller"], json!("src/main.rs:7"));
        assert_eq!(line["retry_count"], json!(3));
        assert_eq!(line["nested"], json!({ "a": [1, 2] }));
        assert!(line.get("stacktrace").is_none());
        assert_eq!(
            line["timestamp"],
            json!(expected_ts.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        );
    }

    #[test]
    fn test_level_filter_applies_inside_dispatcher() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("filtered.log");
        let sinks = Arc::new(Sinks::open(&[path.display().to_string()], Format::Json).unwrap());
        let backend = TracingBackend::new(sinks, Level::Warn);

        backend.emit(Record::new(Level::Info, "dropped", Fields::new()));
        backend.emit(Record::new(Level::Error, "kept", Fields::new()));

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["message"], json!("kept"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    #[traced_test]
    fn test_write_failures_are_reported_outside_the_dispatcher() {
        let sinks = Arc::new(Sinks::open(&["/dev/full".to_string()], Format::Json).unwrap());
        let backend = TracingBackend::new(sinks, Level::Debug);

        backend.emit(Record::new(Level::Info, "disk is full", Fields::new()));

        assert!(logs_contain("failed to write log record"));
        assert!(logs_contain("/dev/full"));
    }
}
