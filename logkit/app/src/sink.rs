// Output destinations. "stdout" and "stderr" are the process streams; any
// other entry is a file path opened in append mode, parent directories are
// created on open. Each record is written as one line with a single write
// call so lines from concurrent callers never interleave.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::LoggerError;
use crate::option::Format;
use crate::record::Record;

enum Output {
    Stdout,
    Stderr,
    File { path: PathBuf, file: File },
}

impl Output {
    fn open(spec: &str) -> Result<Self, LoggerError> {
        match spec {
            "stdout" => Ok(Output::Stdout),
            "stderr" => Ok(Output::Stderr),
            path => {
                let path = PathBuf::from(path);
                if let Some(parent) = path.parent()
                    && !parent.as_os_str().is_empty()
                {
                    std::fs::create_dir_all(parent).map_err(|source| LoggerError::Output {
                        path: path.display().to_string(),
                        source,
                    })?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .map_err(|source| LoggerError::Output {
                        path: path.display().to_string(),
                        source,
                    })?;
                Ok(Output::File { path, file })
            }
        }
    }

    fn name(&self) -> String {
        match self {
            Output::Stdout => "stdout".to_string(),
            Output::Stderr => "stderr".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        match self {
            Output::Stdout => io::stdout().lock().write_all(line),
            Output::Stderr => io::stderr().lock().write_all(line),
            Output::File { file, .. } => file.write_all(line),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout => io::stdout().flush(),
            Output::Stderr => io::stderr().flush(),
            Output::File { file, .. } => file.sync_data(),
        }
    }
}

/// An output that rejected a record.
#[derive(Debug)]
pub(crate) struct WriteFailure {
    pub(crate) output: String,
    pub(crate) error: io::Error,
}

/// Report failed writes as `tracing` warnings. Must not be called from inside
/// a logger's own dispatcher, where nested events are discarded.
pub(crate) fn report(failures: Vec<WriteFailure>) {
    for failure in failures {
        tracing::warn!(
            output = %failure.output,
            error = %failure.error,
            "failed to write log record"
        );
    }
}

/// The set of outputs a logger writes to, plus the line format.
pub(crate) struct Sinks {
    format: Format,
    outputs: Mutex<Vec<Output>>,
}

impl Sinks {
    pub(crate) fn open(paths: &[String], format: Format) -> Result<Self, LoggerError> {
        let mut outputs: Vec<Output> = Vec::with_capacity(paths.len());
        let mut seen: Vec<&str> = Vec::with_capacity(paths.len());
        for spec in paths.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            if seen.contains(&spec) {
                continue;
            }
            seen.push(spec);
            outputs.push(Output::open(spec)?);
        }
        Ok(Self {
            format,
            outputs: Mutex::new(outputs),
        })
    }

    pub(crate) fn format(&self) -> Format {
        self.format
    }

    /// Write `record` to every output, returning the outputs that failed.
    pub(crate) fn write(&self, record: &Record) -> Vec<WriteFailure> {
        let mut line = record.encode(self.format);
        line.push('\n');
        let mut outputs = self.outputs.lock().unwrap_or_else(|e| e.into_inner());
        outputs
            .iter_mut()
            .filter_map(|output| {
                output
                    .write_line(line.as_bytes())
                    .err()
                    .map(|error| WriteFailure {
                        output: output.name(),
                        error,
                    })
            })
            .collect()
    }

    pub(crate) fn flush(&self) {
        let mut outputs = self.outputs.lock().unwrap_or_else(|e| e.into_inner());
        for output in outputs.iter_mut() {
            if let Err(e) = output.flush() {
                tracing::warn!(output = %output.name(), error = %e, "failed to flush log output");
            }
        }
    }

    pub(crate) fn names(&self) -> Vec<String> {
        let outputs = self.outputs.lock().unwrap_or_else(|e| e.into_inner());
        outputs.iter().map(Output::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/app.log");
        let sinks = Sinks::open(&[path.display().to_string()], Format::Json).unwrap();

        sinks.write(&Record::new(Level::Info, "hello", crate::fields! {}));
        sinks.flush();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"message\":\"hello\""));
    }

    #[test]
    fn test_duplicate_outputs_are_opened_once() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dup.log").display().to_string();
        let sinks = Sinks::open(&[path.clone(), path.clone(), "stdout".into()], Format::Json).unwrap();
        assert_eq!(sinks.names(), vec![path, "stdout".to_string()]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_returns_failed_outputs() {
        let sinks = Sinks::open(&["/dev/full".to_string()], Format::Json).unwrap();
        let failures = sinks.write(&Record::new(Level::Info, "no space", crate::fields! {}));
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].output, "/dev/full");
    }

    #[test]
    fn test_open_fails_for_directory_path() {
        let temp_dir = TempDir::new().unwrap();
        let result = Sinks::open(&[temp_dir.path().display().to_string()], Format::Json);
        assert!(matches!(result, Err(LoggerError::Output { .. })));
    }
}
