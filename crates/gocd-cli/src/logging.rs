//! Logging bootstrap using `tracing` and `tracing-subscriber`.

use std::io;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

/// Initialize the global subscriber. `RUST_LOG` overrides the CLI level.
pub fn init_logging(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level
            .into_level()
            .map_or_else(|| "off".to_string(), |level| level.as_str().to_lowercase());
        // external crates stay at warn level to reduce noise
        EnvFilter::new(format!(
            "warn,gocd_cli={level},gocd_client={level},gocd_config={level},gocd_xml={level}"
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).without_time())
        .init();
}
