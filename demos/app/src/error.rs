use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize logger: {0}")]
    Logger(#[from] logkit::LoggerError),

    #[error("Failed to bind to address {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),
}
