use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured filter.
///
/// # Errors
/// Fails when the filter does not parse or a subscriber is already installed.
pub fn init(cfg: &LoggingConfig) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&cfg.filter)?,
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if cfg.json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize JSON logger: {e}"))?;
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to initialize logger: {e}"))?;
    }
    tracing::debug!(json = cfg.json, "logging initialized");
    Ok(())
}
