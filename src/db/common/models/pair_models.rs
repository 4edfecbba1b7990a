use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Pair {
    pub id: String,
    pub token0_id: String,
    pub token1_id: String,
    pub reserve0: BigDecimal,
    pub reserve1: BigDecimal,
    /// Outstanding LP tokens.
    pub total_supply: BigDecimal,
    pub reserve_eth: BigDecimal,
    pub reserve_usd: BigDecimal,
    pub tracked_reserve_eth: BigDecimal,
    /// token0 per token1.
    pub token0_price: BigDecimal,
    /// token1 per token0.
    pub token1_price: BigDecimal,
    pub volume_token0: BigDecimal,
    pub volume_token1: BigDecimal,
    pub volume_usd: BigDecimal,
    pub untracked_volume_usd: BigDecimal,
    pub tx_count: i64,
    pub liquidity_provider_count: i64,
    pub created_at_timestamp: DateTime<Utc>,
    pub created_at_block_number: i64,
}

impl Pair {
    pub fn new(
        id: impl Into<String>,
        token0_id: impl Into<String>,
        token1_id: impl Into<String>,
        created_at_timestamp: DateTime<Utc>,
        created_at_block_number: i64,
    ) -> Self {
        Self {
            id: id.into(),
            token0_id: token0_id.into(),
            token1_id: token1_id.into(),
            reserve0: BigDecimal::zero(),
            reserve1: BigDecimal::zero(),
            total_supply: BigDecimal::zero(),
            reserve_eth: BigDecimal::zero(),
            reserve_usd: BigDecimal::zero(),
            tracked_reserve_eth: BigDecimal::zero(),
            token0_price: BigDecimal::zero(),
            token1_price: BigDecimal::zero(),
            volume_token0: BigDecimal::zero(),
            volume_token1: BigDecimal::zero(),
            volume_usd: BigDecimal::zero(),
            untracked_volume_usd: BigDecimal::zero(),
            tx_count: 0,
            liquidity_provider_count: 0,
            created_at_timestamp,
            created_at_block_number,
        }
    }

    /// Whether `token` is one side of this pair.
    pub fn has_token(&self, token: &str) -> bool {
        self.token0_id == token || self.token1_id == token
    }

    /// Whether this pair trades `a` against `b`, in either orientation.
    pub fn connects(&self, a: &str, b: &str) -> bool {
        (self.token0_id == a && self.token1_id == b) || (self.token0_id == b && self.token1_id == a)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LiquidityPosition {
    /// `{pair}-{user}`
    pub id: String,
    pub pair_id: String,
    pub user: String,
    pub liquidity_token_balance: BigDecimal,
}

impl LiquidityPosition {
    pub fn position_id(pair_id: &str, user: &str) -> String {
        format!("{}-{}", pair_id, user)
    }

    pub fn new(pair_id: &str, user: &str) -> Self {
        Self {
            id: Self::position_id(pair_id, user),
            pair_id: pair_id.to_string(),
            user: user.to_string(),
            liquidity_token_balance: BigDecimal::zero(),
        }
    }
}
