use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use crate::engine::{self, Backend};
use crate::error::LoggerError;
use crate::fields::{self, Fields};
use crate::level::Level;
use crate::option::{Engine, Format, LogOption, OtlpProtocol};
use crate::record::Record;
use crate::sink::Sinks;

struct Inner {
    backend: Box<dyn Backend>,
    sinks: Arc<Sinks>,
    engine: Engine,
    level: Level,
    add_caller: bool,
    stacktrace_from: Option<Level>,
    otlp: Option<(String, OtlpProtocol)>,
}

/// Leveled, structured logger.
///
/// Cloning is cheap; clones and children made with [`Logger::with`] share the
/// same outputs.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
    fields: Arc<Fields>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("engine", &self.inner.engine)
            .field("level", &self.inner.level)
            .field("format", &self.inner.sinks.format())
            .field("outputs", &self.inner.sinks.names())
            .field("fields", &self.fields)
            .finish()
    }
}

impl Logger {
    /// Build a logger from an option record.
    ///
    /// `service.name` and `service.version` are always present in the
    /// logger's constant fields; `"unknown"` stands in for either when the
    /// option does not provide a value.
    ///
    /// # Errors
    /// Returns [`LoggerError`] when the option is invalid or an output cannot
    /// be opened.
    pub fn new(option: &LogOption) -> Result<Self, LoggerError> {
        option.validate()?;

        let sinks = Arc::new(Sinks::open(&option.output_paths, option.format)?);
        let backend = engine::build(option.engine, Arc::clone(&sinks), option.level);

        let stacktrace_from = match (option.disable_stacktrace, option.development) {
            (true, _) => None,
            (false, true) => Some(Level::Warn),
            (false, false) => Some(Level::Error),
        };

        let otlp = option.is_otlp_enabled().then(|| {
            let protocol = option
                .otlp
                .as_ref()
                .map(|otlp| otlp.protocol)
                .unwrap_or_default();
            (option.resolved_otlp_endpoint().to_string(), protocol)
        });
        if let Some((endpoint, protocol)) = &otlp {
            tracing::info!(
                %endpoint,
                %protocol,
                "otlp export configured; records are written to local outputs only"
            );
        }

        tracing::debug!(
            engine = %option.engine,
            level = %option.level,
            format = %option.format,
            outputs = ?sinks.names(),
            "logger initialized"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                sinks,
                engine: option.engine,
                level: option.level,
                add_caller: !option.disable_caller,
                stacktrace_from,
                otlp,
            }),
            fields: Arc::new(fields::with_service_defaults(&option.initial_fields)),
        })
    }

    /// Child logger carrying additional constant fields.
    pub fn with(&self, extra: Fields) -> Logger {
        let mut fields = (*self.fields).clone();
        fields.extend(extra);
        Logger {
            inner: Arc::clone(&self.inner),
            fields: Arc::new(fields),
        }
    }

    pub fn enabled(&self, level: Level) -> bool {
        level >= self.inner.level
    }

    pub fn level(&self) -> Level {
        self.inner.level
    }

    pub fn engine(&self) -> Engine {
        self.inner.engine
    }

    pub fn format(&self) -> Format {
        self.inner.sinks.format()
    }

    pub fn outputs(&self) -> Vec<String> {
        self.inner.sinks.names()
    }

    /// Constant fields attached to every record of this logger.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn otlp_endpoint(&self) -> Option<&str> {
        self.inner.otlp.as_ref().map(|(endpoint, _)| endpoint.as_str())
    }

    #[track_caller]
    pub fn log(&self, level: Level, message: &str, fields: Fields) {
        if !self.enabled(level) {
            return;
        }

        let mut merged = (*self.fields).clone();
        merged.extend(fields);
        let mut record = Record::new(level, message, merged);

        if self.inner.add_caller {
            let location = Location::caller();
            record.caller = Some(format!("{}:{}", location.file(), location.line()));
        }
        if let Some(from) = self.inner.stacktrace_from
            && level >= from
        {
            record.stacktrace = Some(Backtrace::force_capture().to_string());
        }

        self.inner.backend.emit(record);
    }

    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(Level::Debug, message, Fields::new());
    }

    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(Level::Info, message, Fields::new());
    }

    #[track_caller]
    pub fn warn(&self, message: &str) {
        self.log(Level::Warn, message, Fields::new());
    }

    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(Level::Error, message, Fields::new());
    }

    #[track_caller]
    pub fn debug_with(&self, message: &str, fields: Fields) {
        self.log(Level::Debug, message, fields);
    }

    #[track_caller]
    pub fn info_with(&self, message: &str, fields: Fields) {
        self.log(Level::Info, message, fields);
    }

    #[track_caller]
    pub fn warn_with(&self, message: &str, fields: Fields) {
        self.log(Level::Warn, message, fields);
    }

    #[track_caller]
    pub fn error_with(&self, message: &str, fields: Fields) {
        self.log(Level::Error, message, fields);
    }

    /// Log at fatal level, flush every output and exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, message: &str) -> ! {
        self.fatal_with(message, Fields::new())
    }

    #[track_caller]
    pub fn fatal_with(&self, message: &str, fields: Fields) -> ! {
        self.log(Level::Fatal, message, fields);
        self.flush();
        std::process::exit(1)
    }

    pub fn flush(&self) {
        self.inner.backend.flush();
    }
}
