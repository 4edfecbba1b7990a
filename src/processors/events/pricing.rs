//! Whitelist price oracle.
//!
//! Prices are quoted in the wrapped native token and converted to USD through
//! a single stablecoin/native reference pair.

use bigdecimal::{BigDecimal, Zero};
use tracing::debug;

use super::mapper_context::MapperContext;
use crate::{
    db::{
        common::models::{Pair, Token},
        store::Store,
    },
    utils::{decimal::round_price, errors::ProcessorResult, token_metadata::TokenContractReader},
};

/// USD price of the native token, read off the stablecoin/native pair.
///
/// Zero until that pair has been created and synced.
pub async fn get_eth_price_in_usd<S: Store, R: TokenContractReader>(
    ctx: &mut MapperContext<'_, S, R>,
) -> ProcessorResult<BigDecimal> {
    let config = ctx.config;
    let pricing = &config.pricing;
    let Some(pair) = ctx.load::<Pair>(&pricing.stable_native_pair_address).await? else {
        debug!(
            "💵 USD reference pair {} not indexed yet",
            pricing.stable_native_pair_address
        );
        return Ok(BigDecimal::zero());
    };

    if pair.token0_id == pricing.stablecoin_address {
        Ok(pair.token0_price)
    } else {
        Ok(pair.token1_price)
    }
}

/// Native-token value of one unit of `token_id`.
///
/// Walks the whitelist in order and prices the token off the first pair with
/// a whitelisted counterparty holding more than the liquidity threshold.
/// Tokens without such a pair are worth zero.
pub async fn find_eth_per_token<S: Store, R: TokenContractReader>(
    ctx: &mut MapperContext<'_, S, R>,
    token_id: &str,
) -> ProcessorResult<BigDecimal> {
    let config = ctx.config;
    let pricing = &config.pricing;
    if token_id == pricing.wrapped_native_address {
        return Ok(BigDecimal::from(1));
    }

    for reference in &pricing.whitelist {
        if reference == token_id {
            continue;
        }
        let Some(pair) = find_pair_for_tokens(ctx, token_id, reference).await? else {
            continue;
        };
        if pair.reserve_eth <= pricing.minimum_liquidity_threshold_eth {
            continue;
        }

        if pair.token0_id == token_id {
            let token1 = ctx.require::<Token>(&pair.token1_id).await?;
            return Ok(round_price(&pair.token1_price * &token1.derived_eth));
        }
        if pair.token1_id == token_id {
            let token0 = ctx.require::<Token>(&pair.token0_id).await?;
            return Ok(round_price(&pair.token0_price * &token0.derived_eth));
        }
    }

    debug!("🔎 No whitelisted pair prices token {}", token_id);
    Ok(BigDecimal::zero())
}

/// Pair joining the two tokens in either orientation.
pub async fn find_pair_for_tokens<S: Store, R: TokenContractReader>(
    ctx: &mut MapperContext<'_, S, R>,
    token_a: &str,
    token_b: &str,
) -> ProcessorResult<Option<Pair>> {
    if let Some(pair_id) = ctx.cache.pair_for_tokens(token_a, token_b) {
        let pair_id = pair_id.to_string();
        return ctx.load::<Pair>(&pair_id).await;
    }

    let cached = ctx
        .cache
        .cached::<Pair>()
        .find(|pair| pair.connects(token_a, token_b))
        .map(|pair| pair.id.clone());
    let pair_id = match cached {
        Some(pair_id) => pair_id,
        None => {
            let (a, b) = (token_a.to_string(), token_b.to_string());
            let found = ctx
                .store
                .find::<Pair, _>(move |pair| pair.connects(&a, &b))
                .await?;
            match found.into_iter().next() {
                Some(pair) => pair.id,
                None => return Ok(None),
            }
        },
    };

    ctx.cache.remember_pair(token_a, token_b, &pair_id);
    ctx.load::<Pair>(&pair_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::processor_config::{AmmProcessorConfig, PricingConfig},
        db::{cache::EntityCache, store::InMemoryStore},
        utils::token_metadata::{StaticTokenReader, TokenMetadata},
    };
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    const WETH: &str = "0x00000000000000000000000000000000000000e1";
    const USDC: &str = "0x00000000000000000000000000000000000000c1";
    const XYZ: &str = "0x00000000000000000000000000000000000000f1";
    const XYZ_WETH: &str = "0x00000000000000000000000000000000000000a1";
    const USDC_XYZ: &str = "0x00000000000000000000000000000000000000a2";
    const USDC_WETH: &str = "0x00000000000000000000000000000000000000a3";

    fn dec(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn token(id: &str, derived_eth: &str) -> Token {
        let mut token = Token::from_metadata(
            id,
            TokenMetadata {
                symbol: "T".to_string(),
                name: "Token".to_string(),
                decimals: 18,
                total_supply: BigDecimal::zero(),
            },
        );
        token.derived_eth = dec(derived_eth);
        token
    }

    fn pair(id: &str, token0: &str, token1: &str, reserve_eth: &str, token0_price: &str, token1_price: &str) -> Pair {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut pair = Pair::new(id, token0, token1, created, 1);
        pair.reserve_eth = dec(reserve_eth);
        pair.token0_price = dec(token0_price);
        pair.token1_price = dec(token1_price);
        pair
    }

    async fn store(xyz_weth_reserve_eth: &str) -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .save(vec![
                token(WETH, "1"),
                token(USDC, "0.0005"),
                token(XYZ, "0"),
            ])
            .await
            .unwrap();
        store
            .save(vec![
                // 3 WETH per XYZ.
                pair(XYZ_WETH, XYZ, WETH, xyz_weth_reserve_eth, "0.33333333333333333333", "3"),
                // 4000 USDC per XYZ, worth 2 WETH.
                pair(USDC_XYZ, USDC, XYZ, "100", "4000", "0.00025"),
                pair(USDC_WETH, USDC, WETH, "1000", "2000", "0.0005"),
            ])
            .await
            .unwrap();
        store
    }

    fn config(whitelist: &[&str]) -> AmmProcessorConfig {
        AmmProcessorConfig::new("0xfactory", PricingConfig::new(WETH, USDC, USDC_WETH, whitelist))
    }

    async fn price_of(store: &InMemoryStore, config: &AmmProcessorConfig, token_id: &str) -> BigDecimal {
        let mut cache = EntityCache::new();
        let reader = StaticTokenReader::default();
        let mut ctx = MapperContext::new(&mut cache, store, &reader, config);
        find_eth_per_token(&mut ctx, token_id).await.unwrap()
    }

    #[tokio::test]
    async fn test_whitelist_order_decides_reference_pair() {
        let store = store("10").await;
        assert_eq!(price_of(&store, &config(&[WETH, USDC]), XYZ).await, dec("3"));
        assert_eq!(price_of(&store, &config(&[USDC, WETH]), XYZ).await, dec("2"));
    }

    #[tokio::test]
    async fn test_thin_reference_pairs_are_skipped() {
        // Reserve exactly at the threshold does not qualify.
        let store = store("5").await;
        assert_eq!(price_of(&store, &config(&[WETH, USDC]), XYZ).await, dec("2"));
        assert!(price_of(&store, &config(&[WETH]), XYZ).await.is_zero());
    }

    #[tokio::test]
    async fn test_native_and_unpriced_tokens() {
        let store = store("10").await;
        let config = config(&[WETH, USDC]);
        assert_eq!(price_of(&store, &config, WETH).await, dec("1"));
        assert!(price_of(&store, &config, "0x00000000000000000000000000000000000000ff")
            .await
            .is_zero());
    }

    #[tokio::test]
    async fn test_eth_price_reads_stablecoin_side() {
        let store = store("10").await;
        let config = config(&[WETH, USDC]);
        let mut cache = EntityCache::new();
        let reader = StaticTokenReader::default();
        let mut ctx = MapperContext::new(&mut cache, &store, &reader, &config);
        assert_eq!(get_eth_price_in_usd(&mut ctx).await.unwrap(), dec("2000"));

        let empty = InMemoryStore::new();
        let mut cache = EntityCache::new();
        let mut ctx = MapperContext::new(&mut cache, &empty, &reader, &config);
        assert!(get_eth_price_in_usd(&mut ctx).await.unwrap().is_zero());
    }
}
