//! Logging and tracing utilities

use crate::config::{AppConfig, LogFormat};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing from an [`AppConfig`]
///
/// `RUST_LOG` wins over `config.log_level`. Fails instead of panicking if a
/// subscriber is already installed.
pub fn init_tracing_with(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?,
    }

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        format = ?config.log_format,
        "Logging initialized"
    );
    Ok(())
}
