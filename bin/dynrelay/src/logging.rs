//! Logging.

use anyhow::Error as GenericError;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter, Layer};

/// Logs a message to standard error and exits the process with a non-zero exit code.
pub fn fatal_and_exit(message: String) -> ! {
    eprintln!("FATAL: {}", message);
    std::process::exit(1);
}

fn is_json_format() -> bool {
    std::env::var("DYNRELAY_LOG_FORMAT_JSON")
        .map(|s| s.trim().to_lowercase())
        .map(|s| s == "true" || s == "1")
        .unwrap_or(false)
}

/// Initializes the logging subsystem for `tracing`.
///
/// This function reads the `DYNRELAY_LOG_LEVEL` environment variable to determine the log level to use. If the
/// environment variable is not set, `default_level` is used, or `INFO` if that isn't set either. Additionally, it
/// reads the `DYNRELAY_LOG_FORMAT_JSON` environment variable to determine which output format to use: if it is set to
/// `true` or `1`, logs are formatted as JSON, and otherwise as human-readable text.
///
/// Logs are always written to standard error, as standard output may be carrying relayed data.
///
/// # Errors
///
/// If the logging subsystem was already initialized, an error will be returned.
pub fn initialize_logging(default_level: Option<LevelFilter>) -> Result<(), GenericError> {
    let level_filter = EnvFilter::builder()
        .with_default_directive(default_level.unwrap_or(LevelFilter::INFO).into())
        .with_env_var("DYNRELAY_LOG_LEVEL")
        .from_env_lossy();

    let layer = if is_json_format() {
        tracing_subscriber::fmt::Layer::new()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::Layer::new()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(level_filter))
        .try_init()?;

    Ok(())
}
