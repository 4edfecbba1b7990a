use ahash::AHashMap;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::utils::decimal::parse_raw_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum Erc20Method {
    Symbol,
    Name,
    Decimals,
    TotalSupply,
}

/// Value returned by a contract call, as decoded by the reader.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractValue {
    Text(String),
    Bytes32([u8; 32]),
    Uint(BigDecimal),
}

/// Read-only access to token contracts.
#[async_trait]
pub trait TokenContractReader: Send + Sync {
    /// Calls `method` through the standard ERC-20 ABI.
    async fn call(&self, address: &str, method: Erc20Method) -> Result<ContractValue>;

    /// Calls `method` through the legacy ABI whose string getters return `bytes32`.
    async fn call_bytes32(&self, address: &str, method: Erc20Method) -> Result<[u8; 32]>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenMetadata {
    pub symbol: String,
    pub name: String,
    pub decimals: u8,
    /// Raw on-chain integer.
    pub total_supply: BigDecimal,
}

pub async fn fetch_token_symbol<R: TokenContractReader + ?Sized>(
    reader: &R,
    address: &str,
) -> Result<String> {
    fetch_string_with_fallback(reader, address, Erc20Method::Symbol).await
}

pub async fn fetch_token_name<R: TokenContractReader + ?Sized>(
    reader: &R,
    address: &str,
) -> Result<String> {
    fetch_string_with_fallback(reader, address, Erc20Method::Name).await
}

pub async fn fetch_token_decimals<R: TokenContractReader + ?Sized>(
    reader: &R,
    address: &str,
) -> Result<u8> {
    let value = fetch_uint(reader, address, Erc20Method::Decimals).await?;
    value
        .with_scale(0)
        .to_string()
        .parse::<u8>()
        .map_err(|_| anyhow!("decimals of {} out of range: {}", address, value))
}

pub async fn fetch_token_total_supply<R: TokenContractReader + ?Sized>(
    reader: &R,
    address: &str,
) -> Result<BigDecimal> {
    fetch_uint(reader, address, Erc20Method::TotalSupply).await
}

/// Fetches all four fields concurrently. Fails if any of them is unavailable.
pub async fn fetch_token_metadata<R: TokenContractReader + ?Sized>(
    reader: &R,
    address: &str,
) -> Result<TokenMetadata> {
    let (symbol, name, decimals, total_supply) = futures::try_join!(
        fetch_token_symbol(reader, address),
        fetch_token_name(reader, address),
        fetch_token_decimals(reader, address),
        fetch_token_total_supply(reader, address),
    )?;

    debug!(
        "🔍 Token {} metadata: symbol={}, name={}, decimals={}",
        address, symbol, name, decimals
    );

    Ok(TokenMetadata {
        symbol,
        name,
        decimals,
        total_supply,
    })
}

async fn fetch_string_with_fallback<R: TokenContractReader + ?Sized>(
    reader: &R,
    address: &str,
    method: Erc20Method,
) -> Result<String> {
    match reader.call(address, method).await {
        Ok(ContractValue::Text(value)) => return Ok(value),
        Ok(other) => debug!(
            "🔁 {} of {} returned {:?}, retrying with bytes32 ABI",
            method, address, other
        ),
        Err(e) => debug!(
            "🔁 {} of {} failed ({}), retrying with bytes32 ABI",
            method, address, e
        ),
    }

    let bytes = reader
        .call_bytes32(address, method)
        .await
        .with_context(|| format!("{} lookup failed for {}", method, address))?;

    Ok(decode_bytes32(&bytes))
}

async fn fetch_uint<R: TokenContractReader + ?Sized>(
    reader: &R,
    address: &str,
    method: Erc20Method,
) -> Result<BigDecimal> {
    match reader.call(address, method).await? {
        ContractValue::Uint(value) if value.is_integer() && value >= BigDecimal::from(0) => {
            Ok(value)
        },
        other => Err(anyhow!(
            "{} of {} is not an unsigned integer: {:?}",
            method,
            address,
            other
        )),
    }
}

/// ASCII text of a `bytes32` value with trailing NUL padding removed.
pub fn decode_bytes32(bytes: &[u8; 32]) -> String {
    let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
    bytes[..end].iter().map(|b| (b & 0x7f) as char).collect()
}

pub fn encode_bytes32(text: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    for (slot, byte) in out.iter_mut().zip(text.bytes()) {
        *slot = byte;
    }
    out
}

/// Token entry of a static metadata file.
///
/// `symbol_bytes32`/`name_bytes32` describe tokens that only implement the
/// legacy ABI: the standard call then yields raw bytes instead of text.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StaticTokenEntry {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol_bytes32: Option<String>,
    #[serde(default)]
    pub name_bytes32: Option<String>,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub total_supply: Option<String>,
}

/// Serves token metadata from a fixed table keyed by lowercase address.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenReader {
    tokens: AHashMap<String, StaticTokenEntry>,
}

impl StaticTokenReader {
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, StaticTokenEntry)>,
    {
        Self {
            tokens: entries
                .into_iter()
                .map(|(address, entry)| (address.to_lowercase(), entry))
                .collect(),
        }
    }

    /// Loads a JSON object of `{ "<address>": StaticTokenEntry }`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token metadata file {}", path.display()))?;
        let entries: AHashMap<String, StaticTokenEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse token metadata file {}", path.display()))?;

        info!("📇 Loaded metadata for {} tokens", entries.len());
        Ok(Self::new(entries))
    }

    fn entry(&self, address: &str) -> Result<&StaticTokenEntry> {
        self.tokens
            .get(&address.to_lowercase())
            .ok_or_else(|| anyhow!("Unknown token contract {}", address))
    }
}

#[async_trait]
impl TokenContractReader for StaticTokenReader {
    async fn call(&self, address: &str, method: Erc20Method) -> Result<ContractValue> {
        let entry = self.entry(address)?;
        let (text, legacy) = match method {
            Erc20Method::Symbol => (&entry.symbol, &entry.symbol_bytes32),
            Erc20Method::Name => (&entry.name, &entry.name_bytes32),
            Erc20Method::Decimals => {
                let decimals = entry
                    .decimals
                    .ok_or_else(|| anyhow!("decimals() reverted for {}", address))?;
                return Ok(ContractValue::Uint(BigDecimal::from(decimals as u32)));
            },
            Erc20Method::TotalSupply => {
                let supply = entry
                    .total_supply
                    .as_deref()
                    .ok_or_else(|| anyhow!("totalSupply() reverted for {}", address))?;
                return Ok(ContractValue::Uint(parse_raw_amount(supply)?));
            },
        };

        match (text, legacy) {
            (Some(text), _) => Ok(ContractValue::Text(text.clone())),
            (None, Some(legacy)) => Ok(ContractValue::Bytes32(encode_bytes32(legacy))),
            (None, None) => Err(anyhow!("{}() reverted for {}", method, address)),
        }
    }

    async fn call_bytes32(&self, address: &str, method: Erc20Method) -> Result<[u8; 32]> {
        let entry = self.entry(address)?;
        let legacy = match method {
            Erc20Method::Symbol => &entry.symbol_bytes32,
            Erc20Method::Name => &entry.name_bytes32,
            _ => &None,
        };
        legacy
            .as_deref()
            .map(encode_bytes32)
            .ok_or_else(|| anyhow!("{}() bytes32 call reverted for {}", method, address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn reader() -> StaticTokenReader {
        StaticTokenReader::new(vec![
            (
                "0xAAAA".to_string(),
                StaticTokenEntry {
                    symbol: Some("WETH".to_string()),
                    name: Some("Wrapped Ether".to_string()),
                    decimals: Some(18),
                    total_supply: Some("1000000000000000000000".to_string()),
                    ..Default::default()
                },
            ),
            (
                "0xbbbb".to_string(),
                StaticTokenEntry {
                    symbol_bytes32: Some("MKR".to_string()),
                    name_bytes32: Some("Maker".to_string()),
                    decimals: Some(18),
                    total_supply: Some("0".to_string()),
                    ..Default::default()
                },
            ),
            (
                "0xcccc".to_string(),
                StaticTokenEntry {
                    symbol: Some("BAD".to_string()),
                    name: Some("No Decimals".to_string()),
                    total_supply: Some("1".to_string()),
                    ..Default::default()
                },
            ),
        ])
    }

    #[tokio::test]
    async fn test_fetch_standard_metadata() {
        let metadata = fetch_token_metadata(&reader(), "0xaaaa").await.unwrap();
        assert_eq!(metadata.symbol, "WETH");
        assert_eq!(metadata.name, "Wrapped Ether");
        assert_eq!(metadata.decimals, 18);
        assert_eq!(
            metadata.total_supply,
            BigDecimal::from_str("1000000000000000000000").unwrap()
        );
    }

    #[tokio::test]
    async fn test_bytes32_fallback_for_legacy_tokens() {
        let reader = reader();
        assert_eq!(fetch_token_symbol(&reader, "0xbbbb").await.unwrap(), "MKR");
        assert_eq!(fetch_token_name(&reader, "0xBBBB").await.unwrap(), "Maker");
    }

    #[tokio::test]
    async fn test_missing_decimals_fails_the_lookup() {
        assert!(fetch_token_metadata(&reader(), "0xcccc").await.is_err());
        assert!(fetch_token_metadata(&reader(), "0xdddd").await.is_err());
    }

    #[test]
    fn test_decode_bytes32_trims_padding() {
        assert_eq!(decode_bytes32(&encode_bytes32("DAI")), "DAI");
        assert_eq!(decode_bytes32(&[0u8; 32]), "");
    }

    #[test]
    fn test_method_names() {
        assert_eq!(Erc20Method::TotalSupply.to_string(), "totalSupply");
        assert_eq!(
            Erc20Method::from_str("decimals").unwrap(),
            Erc20Method::Decimals
        );
    }
}
