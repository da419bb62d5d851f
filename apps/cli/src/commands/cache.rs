use anyhow::Context;
use tracing::info;
use tradingagents_dataflows::{DataCache, DataflowsConfig};

fn open(config: &DataflowsConfig) -> anyhow::Result<DataCache> {
    DataCache::new(config.cache.clone())
        .with_context(|| format!("Failed to open cache at {}", config.cache.dir.display()))
}

pub fn stats(config: &DataflowsConfig) -> anyhow::Result<()> {
    let stats = open(config)?.stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

pub fn clear(config: &DataflowsConfig, method: Option<&str>) -> anyhow::Result<()> {
    let removed = open(config)?.clear(method);
    match method {
        Some(method) => info!("Removed {} cached '{}' entries", removed, method),
        None => info!("Removed {} cached entries", removed),
    }
    println!("{}", removed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;
    use tradingagents_dataflows::{CacheConfig, FetchArgs};

    #[test]
    fn test_clear_by_method() {
        let dir = TempDir::new().unwrap();
        let config = DataflowsConfig {
            cache: CacheConfig::new(dir.path()),
            ..DataflowsConfig::default()
        };

        let cache = open(&config).unwrap();
        let args = FetchArgs::positional(["AAPL"]);
        cache.set("get_news", &json!(["headline"]), &args);
        cache.set("get_fundamentals", &json!({"pe": 31.2}), &args);

        clear(&config, Some("get_news")).unwrap();
        let stats = open(&config).unwrap().stats();
        assert_eq!(stats.durable_count, 1);

        clear(&config, None).unwrap();
        assert_eq!(open(&config).unwrap().stats().durable_count, 0);
    }
}
