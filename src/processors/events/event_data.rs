use anyhow::{anyhow, Result};
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::constants::*;
use crate::{
    db::{
        cache::EntityRequests,
        common::models::{LiquidityPosition, BUNDLE_ID},
        store::EntityKind,
    },
    utils::decimal::parse_raw_amount,
};

/// Decoded log as delivered by the chain-log collaborator.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    pub contract_address: String,
    pub event_name: String,
    #[serde(default)]
    pub decoded_args: serde_json::Value,
    pub block_timestamp: DateTime<Utc>,
    pub block_height: i64,
    pub tx_hash: String,
    pub log_index_in_tx: i64,
}

/// Where an event came from.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    /// Lowercase emitting contract.
    pub contract_address: String,
    pub tx_hash: String,
    pub block_timestamp: DateTime<Utc>,
    pub block_height: i64,
    pub log_index: i64,
}

impl EventContext {
    pub fn from_raw(raw: &RawEvent) -> Self {
        Self {
            contract_address: raw.contract_address.to_lowercase(),
            tx_hash: raw.tx_hash.to_lowercase(),
            block_timestamp: raw.block_timestamp,
            block_height: raw.block_height,
            log_index: raw.log_index_in_tx,
        }
    }
}

/// Raw (undecimalized) swap amounts.
#[derive(Debug, Clone, PartialEq)]
pub struct SwapData {
    pub sender: String,
    pub to: String,
    pub amount0_in: BigDecimal,
    pub amount1_in: BigDecimal,
    pub amount0_out: BigDecimal,
    pub amount1_out: BigDecimal,
}

/// Events emitted by a pair contract. Amounts are raw on-chain integers.
#[derive(Debug, Clone, PartialEq)]
pub enum PairEvent {
    Transfer {
        from: String,
        to: String,
        value: BigDecimal,
    },
    Sync {
        reserve0: BigDecimal,
        reserve1: BigDecimal,
    },
    Mint {
        sender: String,
        amount0: BigDecimal,
        amount1: BigDecimal,
    },
    Burn {
        sender: String,
        to: String,
        amount0: BigDecimal,
        amount1: BigDecimal,
    },
    Swap(SwapData),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodedEvent {
    PairCreated {
        context: EventContext,
        token0: String,
        token1: String,
        pair: String,
    },
    Pair {
        context: EventContext,
        event: PairEvent,
    },
}

impl DecodedEvent {
    pub fn context(&self) -> &EventContext {
        match self {
            DecodedEvent::PairCreated { context, .. } => context,
            DecodedEvent::Pair { context, .. } => context,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DecodedEvent::PairCreated { .. } => PAIR_CREATED_EVENT,
            DecodedEvent::Pair { event, .. } => match event {
                PairEvent::Transfer { .. } => TRANSFER_EVENT,
                PairEvent::Sync { .. } => SYNC_EVENT,
                PairEvent::Mint { .. } => MINT_EVENT,
                PairEvent::Burn { .. } => BURN_EVENT,
                PairEvent::Swap(_) => SWAP_EVENT,
            },
        }
    }

    /// Adds the rows this event's mapper will read by id.
    pub fn add_requests(&self, factory_address: &str, requests: &mut EntityRequests) {
        let mut request = |kind: EntityKind, id: &str| {
            requests.entry(kind).or_default().insert(id.to_string());
        };
        request(EntityKind::Factory, factory_address);
        request(EntityKind::Bundle, BUNDLE_ID);

        match self {
            DecodedEvent::PairCreated {
                token0,
                token1,
                pair,
                ..
            } => {
                request(EntityKind::Token, token0);
                request(EntityKind::Token, token1);
                request(EntityKind::Pair, pair);
            },
            DecodedEvent::Pair { context, event } => {
                request(EntityKind::Pair, &context.contract_address);
                request(EntityKind::Transaction, &context.tx_hash);
                let mut request_position = |user: &str| {
                    request(
                        EntityKind::LiquidityPosition,
                        &LiquidityPosition::position_id(&context.contract_address, user),
                    );
                };
                match event {
                    PairEvent::Transfer { from, to, .. } => {
                        for user in [from, to] {
                            if user != ADDRESS_ZERO && *user != context.contract_address {
                                request_position(user);
                            }
                        }
                    },
                    PairEvent::Mint { sender, .. } | PairEvent::Burn { sender, .. } => {
                        request_position(sender);
                    },
                    PairEvent::Sync { .. } | PairEvent::Swap(_) => {},
                }
            },
        }
    }
}

/// Decodes a factory `PairCreated` log.
pub fn decode_pair_created(raw: &RawEvent) -> Result<DecodedEvent> {
    let args = &raw.decoded_args;
    let token0 = extract_address(args, "token0")?;
    let token1 = extract_address(args, "token1")?;
    let pair = extract_address(args, "pair")?;

    if token0 == token1 {
        return Err(anyhow!("Pair {} has identical tokens {}", pair, token0));
    }

    Ok(DecodedEvent::PairCreated {
        context: EventContext::from_raw(raw),
        token0,
        token1,
        pair,
    })
}

/// Decodes a pair log. Event names the indexer does not track yield `None`.
pub fn decode_pair_event(raw: &RawEvent) -> Result<Option<DecodedEvent>> {
    let args = &raw.decoded_args;

    let event = match raw.event_name.as_str() {
        TRANSFER_EVENT => PairEvent::Transfer {
            from: extract_address(args, "from")?,
            to: extract_address(args, "to")?,
            value: extract_uint(args, "value")?,
        },
        SYNC_EVENT => PairEvent::Sync {
            reserve0: extract_uint(args, "reserve0")?,
            reserve1: extract_uint(args, "reserve1")?,
        },
        MINT_EVENT => PairEvent::Mint {
            sender: extract_address(args, "sender")?,
            amount0: extract_uint(args, "amount0")?,
            amount1: extract_uint(args, "amount1")?,
        },
        BURN_EVENT => PairEvent::Burn {
            sender: extract_address(args, "sender")?,
            to: extract_address(args, "to")?,
            amount0: extract_uint(args, "amount0")?,
            amount1: extract_uint(args, "amount1")?,
        },
        SWAP_EVENT => PairEvent::Swap(extract_swap_data(args)?),
        other => {
            debug!("⏭️ Ignoring {} event from {}", other, raw.contract_address);
            return Ok(None);
        },
    };

    Ok(Some(DecodedEvent::Pair {
        context: EventContext::from_raw(raw),
        event,
    }))
}

pub fn extract_swap_data(args: &serde_json::Value) -> Result<SwapData> {
    Ok(SwapData {
        sender: extract_address(args, "sender")?,
        to: extract_address(args, "to")?,
        amount0_in: extract_uint(args, "amount0In")?,
        amount1_in: extract_uint(args, "amount1In")?,
        amount0_out: extract_uint(args, "amount0Out")?,
        amount1_out: extract_uint(args, "amount1Out")?,
    })
}

fn extract_address(args: &serde_json::Value, field: &str) -> Result<String> {
    let value = args
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("Missing {}", field))?;

    let hex = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .ok_or_else(|| anyhow!("{} is not a hex address: {}", field, value))?;
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(anyhow!("{} is not a 20-byte address: {}", field, value));
    }

    Ok(format!("0x{}", hex.to_lowercase()))
}

fn extract_uint(args: &serde_json::Value, field: &str) -> Result<BigDecimal> {
    match args.get(field) {
        Some(serde_json::Value::String(raw)) => parse_raw_amount(raw),
        Some(serde_json::Value::Number(number)) => number
            .as_u64()
            .map(BigDecimal::from)
            .ok_or_else(|| anyhow!("{} must be an unsigned integer, got {}", field, number)),
        Some(other) => Err(anyhow!("{} has unexpected type: {}", field, other)),
        None => Err(anyhow!("Missing {}", field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    const PAIR: &str = "0x00000000000000000000000000000000000000aa";
    const USER: &str = "0x00000000000000000000000000000000000000BB";

    fn raw(event_name: &str, args: serde_json::Value) -> RawEvent {
        RawEvent {
            contract_address: PAIR.to_string(),
            event_name: event_name.to_string(),
            decoded_args: args,
            block_timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            block_height: 100,
            tx_hash: "0xABC".to_string(),
            log_index_in_tx: 3,
        }
    }

    #[test]
    fn test_decode_swap() {
        let event = decode_pair_event(&raw(
            SWAP_EVENT,
            json!({
                "sender": USER,
                "to": USER,
                "amount0In": "100",
                "amount1In": 0,
                "amount0Out": "0",
                "amount1Out": "190"
            }),
        ))
        .unwrap()
        .unwrap();

        let DecodedEvent::Pair { context, event } = event else {
            panic!("expected a pair event");
        };
        assert_eq!(context.tx_hash, "0xabc");
        assert_eq!(context.log_index, 3);
        let PairEvent::Swap(swap) = event else {
            panic!("expected a swap");
        };
        assert_eq!(swap.sender, USER.to_lowercase());
        assert_eq!(swap.amount0_in, BigDecimal::from(100));
        assert_eq!(swap.amount1_out, BigDecimal::from(190));
    }

    #[test]
    fn test_decode_errors() {
        let missing = decode_pair_event(&raw(SYNC_EVENT, json!({ "reserve0": "1" })));
        assert!(missing.unwrap_err().to_string().contains("Missing reserve1"));

        let fractional = decode_pair_event(&raw(
            SYNC_EVENT,
            json!({ "reserve0": "1.5", "reserve1": "1" }),
        ));
        assert!(fractional.is_err());

        let bad_address = decode_pair_event(&raw(
            MINT_EVENT,
            json!({ "sender": "0x1234", "amount0": "1", "amount1": "1" }),
        ));
        assert!(bad_address.is_err());
    }

    #[test]
    fn test_unknown_events_are_ignored() {
        assert!(decode_pair_event(&raw("Approval", json!({}))).unwrap().is_none());
    }

    #[test]
    fn test_pair_created_and_requests() {
        let mut created = raw(
            PAIR_CREATED_EVENT,
            json!({
                "token0": "0x00000000000000000000000000000000000000A1",
                "token1": "0x00000000000000000000000000000000000000a2",
                "pair": PAIR,
            }),
        );
        created.contract_address = "0xFACTORY".to_string();
        let event = decode_pair_created(&created).unwrap();
        assert_eq!(event.name(), PAIR_CREATED_EVENT);

        let mut requests = EntityRequests::new();
        event.add_requests("0xfactory", &mut requests);
        assert_eq!(requests[&EntityKind::Token].len(), 2);
        assert!(requests[&EntityKind::Pair].contains(PAIR));

        let transfer = decode_pair_event(&raw(
            TRANSFER_EVENT,
            json!({ "from": ADDRESS_ZERO, "to": USER, "value": "5000" }),
        ))
        .unwrap()
        .unwrap();
        let mut requests = EntityRequests::new();
        transfer.add_requests("0xfactory", &mut requests);
        let positions = &requests[&EntityKind::LiquidityPosition];
        assert_eq!(positions.len(), 1);
        assert!(positions.contains(&format!("{}-{}", PAIR, USER.to_lowercase())));

        let mint = decode_pair_event(&raw(
            MINT_EVENT,
            json!({ "sender": USER, "amount0": "1", "amount1": "2" }),
        ))
        .unwrap()
        .unwrap();
        let mut requests = EntityRequests::new();
        mint.add_requests("0xfactory", &mut requests);
        assert!(requests[&EntityKind::LiquidityPosition]
            .contains(&format!("{}-{}", PAIR, USER.to_lowercase())));
    }
}
