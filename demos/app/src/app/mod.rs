pub mod server;
pub mod tracing;
