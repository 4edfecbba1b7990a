use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

/// Id of the single [`Bundle`] row.
pub const BUNDLE_ID: &str = "1";

/// Global aggregates of one factory deployment, keyed by factory address.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Factory {
    pub id: String,
    pub pair_count: i64,
    pub total_volume_usd: BigDecimal,
    pub total_volume_eth: BigDecimal,
    pub untracked_volume_usd: BigDecimal,
    pub total_liquidity_usd: BigDecimal,
    pub total_liquidity_eth: BigDecimal,
    pub tx_count: i64,
}

impl Factory {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pair_count: 0,
            total_volume_usd: BigDecimal::zero(),
            total_volume_eth: BigDecimal::zero(),
            untracked_volume_usd: BigDecimal::zero(),
            total_liquidity_usd: BigDecimal::zero(),
            total_liquidity_eth: BigDecimal::zero(),
            tx_count: 0,
        }
    }
}

/// USD price of the native currency.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Bundle {
    pub id: String,
    pub eth_price: BigDecimal,
}

impl Default for Bundle {
    fn default() -> Self {
        Self {
            id: BUNDLE_ID.to_string(),
            eth_price: BigDecimal::zero(),
        }
    }
}
