use crate::types::LogLevel;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `--log-level`;
/// events go to stderr so stdout carries only command output.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    // A subscriber may already be installed when running inside tests
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
