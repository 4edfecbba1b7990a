use anyhow::{ensure, Result};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize, strum::IntoStaticStr)]
#[serde(tag = "type", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProcessorConfig {
    AmmAnalyticsProcessor(AmmProcessorConfig),
}

impl ProcessorConfig {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn amm(&self) -> &AmmProcessorConfig {
        match self {
            ProcessorConfig::AmmAnalyticsProcessor(config) => config,
        }
    }

    pub fn amm_mut(&mut self) -> &mut AmmProcessorConfig {
        match self {
            ProcessorConfig::AmmAnalyticsProcessor(config) => config,
        }
    }
}

/// Settings of one factory deployment.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct AmmProcessorConfig {
    pub factory_address: String,
    /// LP amount burned to the zero address on a pair's first mint.
    #[serde(default = "AmmProcessorConfig::default_minimum_liquidity")]
    pub minimum_liquidity: BigDecimal,
    pub pricing: PricingConfig,
    #[serde(default)]
    pub rollup: RollupConfig,
}

impl AmmProcessorConfig {
    fn default_minimum_liquidity() -> BigDecimal {
        BigDecimal::from(1000)
    }

    /// Default minimum liquidity and rollup interval.
    pub fn new(factory_address: &str, pricing: PricingConfig) -> Self {
        let mut config = Self {
            factory_address: factory_address.to_string(),
            minimum_liquidity: Self::default_minimum_liquidity(),
            pricing,
            rollup: RollupConfig::default(),
        };
        config.normalize();
        config
    }

    pub fn normalize(&mut self) {
        self.factory_address = self.factory_address.to_lowercase();
        self.pricing.normalize();
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.factory_address.is_empty(), "factory_address must be set");
        ensure!(
            self.rollup.interval_secs > 0,
            "rollup.interval_secs must be positive, got {}",
            self.rollup.interval_secs
        );
        self.pricing.validate()
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PricingConfig {
    /// Token priced at exactly 1 native unit.
    pub wrapped_native_address: String,
    pub stablecoin_address: String,
    /// Pair of the stablecoin against the wrapped native token.
    pub stable_native_pair_address: String,
    /// Reference tokens in priority order.
    pub whitelist: Vec<String>,
    #[serde(default = "PricingConfig::default_minimum_liquidity_threshold_eth")]
    pub minimum_liquidity_threshold_eth: BigDecimal,
    #[serde(default = "PricingConfig::default_minimum_usd_threshold_new_pairs")]
    pub minimum_usd_threshold_new_pairs: BigDecimal,
    /// Pairs with fewer providers are subject to the new-pair reserve check.
    #[serde(default = "PricingConfig::default_minimum_liquidity_providers")]
    pub minimum_liquidity_providers: i64,
}

impl PricingConfig {
    fn default_minimum_liquidity_threshold_eth() -> BigDecimal {
        BigDecimal::from(5)
    }

    fn default_minimum_usd_threshold_new_pairs() -> BigDecimal {
        BigDecimal::from(3000)
    }

    fn default_minimum_liquidity_providers() -> i64 {
        5
    }

    pub fn new(
        wrapped_native_address: &str,
        stablecoin_address: &str,
        stable_native_pair_address: &str,
        whitelist: &[&str],
    ) -> Self {
        let mut config = Self {
            wrapped_native_address: wrapped_native_address.to_string(),
            stablecoin_address: stablecoin_address.to_string(),
            stable_native_pair_address: stable_native_pair_address.to_string(),
            whitelist: whitelist.iter().map(|w| w.to_string()).collect(),
            minimum_liquidity_threshold_eth: Self::default_minimum_liquidity_threshold_eth(),
            minimum_usd_threshold_new_pairs: Self::default_minimum_usd_threshold_new_pairs(),
            minimum_liquidity_providers: Self::default_minimum_liquidity_providers(),
        };
        config.normalize();
        config
    }

    pub fn normalize(&mut self) {
        self.wrapped_native_address = self.wrapped_native_address.to_lowercase();
        self.stablecoin_address = self.stablecoin_address.to_lowercase();
        self.stable_native_pair_address = self.stable_native_pair_address.to_lowercase();
        for address in self.whitelist.iter_mut() {
            *address = address.to_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.whitelist.is_empty(), "pricing.whitelist must not be empty");
        ensure!(
            self.is_whitelisted(&self.wrapped_native_address),
            "pricing.whitelist must contain the wrapped native token {}",
            self.wrapped_native_address
        );
        Ok(())
    }

    pub fn is_whitelisted(&self, token: &str) -> bool {
        self.whitelist.iter().any(|w| w == token)
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RollupConfig {
    #[serde(default = "RollupConfig::default_interval_secs")]
    pub interval_secs: i64,
}

impl RollupConfig {
    fn default_interval_secs() -> i64 {
        3600
    }
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            interval_secs: Self::default_interval_secs(),
        }
    }
}
