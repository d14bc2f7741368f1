//! A single log record and its line encodings.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::fields::Fields;
use crate::level::Level;
use crate::option::Format;

const RESERVED_KEYS: [&str; 5] = ["timestamp", "level", "caller", "message", "stacktrace"];

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub message: String,
    pub caller: Option<String>,
    /// Constant fields followed by call-site fields.
    pub fields: Fields,
    pub stacktrace: Option<String>,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>, fields: Fields) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            caller: None,
            fields,
            stacktrace: None,
        }
    }

    fn timestamp_str(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Encode as one line (without the trailing newline).
    pub fn encode(&self, format: Format) -> String {
        match format {
            Format::Json => self.encode_json(),
            Format::Console => self.encode_console(),
        }
    }

    pub fn to_json(&self) -> Value {
        let mut out = Fields::with_capacity(self.fields.len() + 5);
        out.insert("timestamp".to_string(), Value::String(self.timestamp_str()));
        out.insert("level".to_string(), Value::String(self.level.as_str().to_string()));
        if let Some(caller) = &self.caller {
            out.insert("caller".to_string(), Value::String(caller.clone()));
        }
        out.insert("message".to_string(), Value::String(self.message.clone()));
        for (key, value) in &self.fields {
            if RESERVED_KEYS.contains(&key.as_str()) {
                out.insert(format!("fields.{key}"), value.clone());
            } else {
                out.insert(key.clone(), value.clone());
            }
        }
        if let Some(stacktrace) = &self.stacktrace {
            out.insert("stacktrace".to_string(), Value::String(stacktrace.clone()));
        }
        Value::Object(out)
    }

    fn encode_json(&self) -> String {
        self.to_json().to_string()
    }

    fn encode_console(&self) -> String {
        let mut line = format!("{}\t{}", self.timestamp_str(), self.level.label());
        if let Some(caller) = &self.caller {
            line.push('\t');
            line.push_str(caller);
        }
        line.push('\t');
        line.push_str(&self.message);
        if !self.fields.is_empty() {
            line.push('\t');
            line.push_str(&Value::Object(self.fields.clone()).to_string());
        }
        if let Some(stacktrace) = &self.stacktrace {
            line.push('\n');
            line.push_str(stacktrace);
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn sample() -> Record {
        let mut record = Record::new(
            Level::Warn,
            "High memory usage",
            crate::fields! { "service.name" => "demo", "usage" => "85%" },
        );
        record.timestamp = Utc.with_ymd_and_hms(2025, 9, 1, 15, 0, 0).unwrap();
        record
    }

    #[test]
    fn test_json_encoding_flattens_fields() {
        let line = sample().encode(Format::Json);
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["timestamp"], json!("2025-09-01T15:00:00.000Z"));
        assert_eq!(value["level"], json!("warn"));
        assert_eq!(value["message"], json!("High memory usage"));
        assert_eq!(value["service.name"], json!("demo"));
        assert_eq!(value["usage"], json!("85%"));
        assert!(value.get("caller").is_none());
    }

    #[test]
    fn test_json_key_order_is_stable() {
        let mut record = sample();
        record.caller = Some("src/main.rs:10".to_string());
        let line = record.encode(Format::Json);
        assert!(line.starts_with(
            r#"{"timestamp":"2025-09-01T15:00:00.000Z","level":"warn","caller":"src/main.rs:10","message":"High memory usage""#
        ));
    }

    #[test]
    fn test_reserved_field_names_are_prefixed() {
        let mut record = sample();
        record.fields.insert("message".to_string(), json!("shadow"));
        let value = record.to_json();
        assert_eq!(value["message"], json!("High memory usage"));
        assert_eq!(value["fields.message"], json!("shadow"));
    }

    #[test]
    fn test_console_encoding() {
        let mut record = sample();
        record.caller = Some("src/main.rs:10".to_string());
        let line = record.encode(Format::Console);
        assert_eq!(
            line,
            "2025-09-01T15:00:00.000Z\tWARN\tsrc/main.rs:10\tHigh memory usage\t{\"service.name\":\"demo\",\"usage\":\"85%\"}"
        );
    }
}
