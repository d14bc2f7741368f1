use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("invalid {field}: {value} (must be one of: {allowed})")]
    InvalidValue {
        field: &'static str,
        value: String,
        allowed: String,
    },

    #[error("invalid logger option: {0}")]
    InvalidOption(String),

    #[error("failed to open output {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
