//! One module per demo program. Each exposes the logger option it uses, the
//! axum router where it serves HTTP, and a `run` entry point for its binary.

pub mod config_driven;
pub mod custom_fields;
pub mod default_fields;
pub mod file_logging;
pub mod http;
pub mod service_fields;
