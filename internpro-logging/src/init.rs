use anyhow::Result;
use internpro_config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Initialize logging from configuration
///
/// Safe to call more than once: if a global subscriber is already installed
/// the call is a no-op.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config.level.as_str());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    let result = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Initialize simple tracing for basic console output
pub fn init_simple_tracing(log_level: &str) -> Result<()> {
    let env_filter = build_env_filter(log_level);

    if tracing_subscriber::fmt().with_env_filter(env_filter).try_init().is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

/// Build the filter for a level directive, falling back to `RUST_LOG` and then `info`
pub fn build_env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
