#![warn(rust_2018_idioms)]

pub mod app;
pub mod config;
pub mod demo;
pub mod env;
pub mod error;
pub mod middleware;

pub use error::DemoError;
