//! Structured logging with constant fields.
//!
//! ```no_run
//! use logkit::{LogOption, Logger, fields};
//!
//! let mut option = LogOption::default();
//! option.add_initial_field("service.name", "orders");
//! let logger = Logger::new(&option)?;
//! logger.info_with("order placed", fields! { "order_id" => 42 });
//! # Ok::<(), logkit::LoggerError>(())
//! ```

mod engine;
mod sink;
pub mod error;
pub mod fields;
pub mod level;
pub mod logger;
pub mod option;
pub mod record;
pub mod version;

pub use error::LoggerError;
pub use fields::Fields;
pub use level::Level;
pub use logger::Logger;
pub use option::{Engine, Format, LogOption, OtlpOption, OtlpProtocol};
pub use record::Record;
pub use version::VersionInfo;
