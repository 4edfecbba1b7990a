use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Events of one on-chain transaction, keyed by tx hash.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub block_number: i64,
    pub timestamp: DateTime<Utc>,
    pub mints: Vec<String>,
    pub burns: Vec<String>,
    pub swaps: Vec<String>,
}

impl Transaction {
    pub fn new(id: impl Into<String>, block_number: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            block_number,
            timestamp,
            mints: Vec::new(),
            burns: Vec::new(),
            swaps: Vec::new(),
        }
    }
}

/// Appends `id` unless a replay of the same event already did.
pub fn push_unique(ids: &mut Vec<String>, id: &str) {
    if !ids.iter().any(|existing| existing == id) {
        ids.push(id.to_string());
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Mint {
    pub id: String,
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub pair_id: String,
    pub sender: String,
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub amount_usd: BigDecimal,
    pub log_index: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Burn {
    pub id: String,
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub pair_id: String,
    pub sender: String,
    pub to: String,
    pub amount0: BigDecimal,
    pub amount1: BigDecimal,
    pub amount_usd: BigDecimal,
    pub log_index: i64,
}

/// One swap. Sold/bought amounts are raw on-chain integers.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TokenSwapEvent {
    pub id: String,
    pub transaction_id: String,
    pub timestamp: DateTime<Utc>,
    pub pair_id: String,
    pub buyer: String,
    pub recipient: String,
    pub token_sold_id: String,
    pub sold_amount: BigDecimal,
    pub token_bought_id: String,
    pub bought_amount: BigDecimal,
    pub amount_usd: BigDecimal,
    pub log_index: i64,
}

/// `{txHash}-{logIndex}`: stable across replays of the same batch.
pub fn event_record_id(tx_hash: &str, log_index: i64) -> String {
    format!("{}-{}", tx_hash, log_index)
}
