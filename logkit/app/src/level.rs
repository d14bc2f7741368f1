use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LoggerError;

/// Severity of a record. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub const ALLOWED: [&'static str; 5] = ["debug", "info", "warn", "error", "fatal"];

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Upper-case label used by the console encoder.
    pub fn label(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            other => Err(LoggerError::InvalidValue {
                field: "level",
                value: other.to_string(),
                allowed: Level::ALLOWED.join(", "),
            }),
        }
    }
}

// tracing has no fatal level; fatal records travel as ERROR and carry a flag.
impl From<Level> for tracing::Level {
    fn from(level: Level) -> Self {
        match level {
            Level::Debug => tracing::Level::DEBUG,
            Level::Info => tracing::Level::INFO,
            Level::Warn => tracing::Level::WARN,
            Level::Error | Level::Fatal => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_every_allowed_level() {
        for name in Level::ALLOWED {
            let level: Level = name.parse().unwrap();
            assert_eq!(level.as_str(), name);
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_mixed_case() {
        assert!("trace".parse::<Level>().is_err());
        assert!("INFO".parse::<Level>().is_err());
        let err = "verbose".parse::<Level>().unwrap_err();
        assert!(err.to_string().contains("verbose"));
        assert!(err.to_string().contains("debug, info, warn, error, fatal"));
    }

    #[test]
    fn test_ordering_follows_severity() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_fatal_maps_to_tracing_error() {
        assert_eq!(tracing::Level::from(Level::Fatal), tracing::Level::ERROR);
        assert_eq!(tracing::Level::from(Level::Debug), tracing::Level::DEBUG);
    }
}
