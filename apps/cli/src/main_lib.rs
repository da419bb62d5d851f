use std::path::PathBuf;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tradingagents_dataflows::DataflowsConfig;

/// Install the global subscriber. `log` records from the library are
/// forwarded through the `tracing-log` bridge.
pub fn init_tracing() {
    let log_format = std::env::var("TA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}

/// Environment configuration with command-line overrides applied.
pub fn load_config(cache_dir: Option<PathBuf>) -> DataflowsConfig {
    let mut config = DataflowsConfig::from_env();
    if let Some(dir) = cache_dir {
        config.cache.dir = dir;
    }
    config
}
