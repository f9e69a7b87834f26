//! Shared utilities for the analyst workspace
//!
//! Logging setup and environment-driven configuration used by the binaries.

pub mod config;
pub mod logging;

pub use config::{AppConfig, ConfigError, LogFormat, parse_var};
pub use logging::init_tracing_with;
