//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LoggingConfig};

/// Initialize the global tracing subscriber from configuration.
///
/// `RUST_LOG` takes precedence over the configured level and filter.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives = config.level.as_str().to_string();
        if let Some(extra) = &config.filter {
            directives.push(',');
            directives.push_str(extra);
        }
        EnvFilter::new(directives)
    });

    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).init(),
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
    }
}
