use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Factory totals as of the last event of a UTC day, keyed by day index.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FactoryDayData {
    pub id: String,
    pub date: DateTime<Utc>,
    pub daily_volume_eth: BigDecimal,
    pub daily_volume_usd: BigDecimal,
    pub daily_volume_untracked: BigDecimal,
    pub total_volume_eth: BigDecimal,
    pub total_volume_usd: BigDecimal,
    pub total_liquidity_eth: BigDecimal,
    pub total_liquidity_usd: BigDecimal,
    pub tx_count: i64,
}

impl FactoryDayData {
    pub fn new(id: String, date: DateTime<Utc>) -> Self {
        Self {
            id,
            date,
            daily_volume_eth: BigDecimal::zero(),
            daily_volume_usd: BigDecimal::zero(),
            daily_volume_untracked: BigDecimal::zero(),
            total_volume_eth: BigDecimal::zero(),
            total_volume_usd: BigDecimal::zero(),
            total_liquidity_eth: BigDecimal::zero(),
            total_liquidity_usd: BigDecimal::zero(),
            tx_count: 0,
        }
    }
}

/// `{pair}-{dayIndex}`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PairDayData {
    pub id: String,
    pub date: DateTime<Utc>,
    pub pair_id: String,
    pub token0_id: String,
    pub token1_id: String,
    pub reserve0: BigDecimal,
    pub reserve1: BigDecimal,
    pub total_supply: BigDecimal,
    pub reserve_usd: BigDecimal,
    pub daily_volume_token0: BigDecimal,
    pub daily_volume_token1: BigDecimal,
    pub daily_volume_usd: BigDecimal,
    pub daily_txns: i64,
}

impl PairDayData {
    pub fn new(id: String, date: DateTime<Utc>, pair_id: &str, token0_id: &str, token1_id: &str) -> Self {
        Self {
            id,
            date,
            pair_id: pair_id.to_string(),
            token0_id: token0_id.to_string(),
            token1_id: token1_id.to_string(),
            reserve0: BigDecimal::zero(),
            reserve1: BigDecimal::zero(),
            total_supply: BigDecimal::zero(),
            reserve_usd: BigDecimal::zero(),
            daily_volume_token0: BigDecimal::zero(),
            daily_volume_token1: BigDecimal::zero(),
            daily_volume_usd: BigDecimal::zero(),
            daily_txns: 0,
        }
    }
}

/// `{pair}-{hourIndex}`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PairHourData {
    pub id: String,
    pub hour_start: DateTime<Utc>,
    pub pair_id: String,
    pub reserve0: BigDecimal,
    pub reserve1: BigDecimal,
    pub total_supply: BigDecimal,
    pub reserve_usd: BigDecimal,
    pub hourly_volume_token0: BigDecimal,
    pub hourly_volume_token1: BigDecimal,
    pub hourly_volume_usd: BigDecimal,
    pub hourly_txns: i64,
}

impl PairHourData {
    pub fn new(id: String, hour_start: DateTime<Utc>, pair_id: &str) -> Self {
        Self {
            id,
            hour_start,
            pair_id: pair_id.to_string(),
            reserve0: BigDecimal::zero(),
            reserve1: BigDecimal::zero(),
            total_supply: BigDecimal::zero(),
            reserve_usd: BigDecimal::zero(),
            hourly_volume_token0: BigDecimal::zero(),
            hourly_volume_token1: BigDecimal::zero(),
            hourly_volume_usd: BigDecimal::zero(),
            hourly_txns: 0,
        }
    }
}

/// `{token}-{dayIndex}`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TokenDayData {
    pub id: String,
    pub date: DateTime<Utc>,
    pub token_id: String,
    pub daily_volume_token: BigDecimal,
    pub daily_volume_eth: BigDecimal,
    pub daily_volume_usd: BigDecimal,
    pub daily_txns: i64,
    pub total_liquidity_token: BigDecimal,
    pub total_liquidity_eth: BigDecimal,
    pub total_liquidity_usd: BigDecimal,
    pub price_usd: BigDecimal,
}

impl TokenDayData {
    pub fn new(id: String, date: DateTime<Utc>, token_id: &str) -> Self {
        Self {
            id,
            date,
            token_id: token_id.to_string(),
            daily_volume_token: BigDecimal::zero(),
            daily_volume_eth: BigDecimal::zero(),
            daily_volume_usd: BigDecimal::zero(),
            daily_txns: 0,
            total_liquidity_token: BigDecimal::zero(),
            total_liquidity_eth: BigDecimal::zero(),
            total_liquidity_usd: BigDecimal::zero(),
            price_usd: BigDecimal::zero(),
        }
    }
}
