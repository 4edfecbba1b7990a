use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use super::processor_config::ProcessorConfig;

pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IndexerProcessorConfig {
    pub processor_config: ProcessorConfig,
    /// Events per processed batch when replaying an event file.
    #[serde(default = "IndexerProcessorConfig::default_batch_size")]
    pub batch_size: usize,
    /// JSON table of token metadata served to the PairCreated mapper.
    #[serde(default)]
    pub token_metadata_path: Option<PathBuf>,
}

impl IndexerProcessorConfig {
    fn default_batch_size() -> usize {
        DEFAULT_BATCH_SIZE
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        info!(
            "⚙️ Loaded {} config: factory={}, whitelist={} tokens, batch_size={}",
            config.processor_config.name(),
            config.processor_config.amm().factory_address,
            config.processor_config.amm().pricing.whitelist.len(),
            config.batch_size
        );
        Ok(config)
    }

    /// Parses, normalizes and validates a JSON config document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(raw)?;
        config.processor_config.amm_mut().normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be positive");
        self.processor_config.amm().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "processor_config": {
            "type": "amm_analytics_processor",
            "factory_address": "0xFactory",
            "minimum_liquidity": "1000",
            "pricing": {
                "wrapped_native_address": "0xWETH",
                "stablecoin_address": "0xUSDC",
                "stable_native_pair_address": "0xPAIR",
                "whitelist": ["0xWETH", "0xUSDC"],
                "minimum_liquidity_threshold_eth": "2.5"
            },
            "rollup": { "interval_secs": 1800 }
        },
        "token_metadata_path": "tokens.json"
    }"#;

    #[test]
    fn test_load_normalizes_addresses() {
        let config = IndexerProcessorConfig::from_json_str(CONFIG).unwrap();
        let amm = config.processor_config.amm();

        assert_eq!(amm.factory_address, "0xfactory");
        assert_eq!(amm.pricing.whitelist, vec!["0xweth", "0xusdc"]);
        assert_eq!(amm.pricing.stable_native_pair_address, "0xpair");
        assert_eq!(amm.rollup.interval_secs, 1800);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
        assert_eq!(config.token_metadata_path, Some(PathBuf::from("tokens.json")));
        assert_eq!(
            amm.pricing.minimum_liquidity_threshold_eth.to_string(),
            "2.5"
        );
    }

    #[test]
    fn test_rejects_unknown_fields_and_bad_values() {
        assert!(IndexerProcessorConfig::from_json_str(
            &CONFIG.replace("\"token_metadata_path\"", "\"token_path\"")
        )
        .is_err());
        assert!(IndexerProcessorConfig::from_json_str(
            &CONFIG.replace("\"interval_secs\": 1800", "\"interval_secs\": -1")
        )
        .is_err());
    }
}
