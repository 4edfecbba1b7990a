use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::utils::{decimal::convert_token_to_decimal, token_metadata::TokenMetadata};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Token {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// In token units.
    pub total_supply: BigDecimal,
    pub trade_volume: BigDecimal,
    pub trade_volume_usd: BigDecimal,
    pub untracked_volume_usd: BigDecimal,
    pub tx_count: i64,
    /// Sum of this token's reserves over all pairs.
    pub total_liquidity: BigDecimal,
    /// Price in native currency, refreshed on every Sync touching the token.
    pub derived_eth: BigDecimal,
}

impl Token {
    pub fn from_metadata(id: impl Into<String>, metadata: TokenMetadata) -> Self {
        Self {
            id: id.into(),
            total_supply: convert_token_to_decimal(&metadata.total_supply, metadata.decimals),
            symbol: metadata.symbol,
            name: metadata.name,
            decimals: metadata.decimals,
            trade_volume: BigDecimal::zero(),
            trade_volume_usd: BigDecimal::zero(),
            untracked_volume_usd: BigDecimal::zero(),
            tx_count: 0,
            total_liquidity: BigDecimal::zero(),
            derived_eth: BigDecimal::zero(),
        }
    }
}
