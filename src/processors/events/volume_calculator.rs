use bigdecimal::{BigDecimal, Zero};

use crate::{
    config::processor_config::PricingConfig,
    db::common::models::{Pair, Token},
    utils::decimal::round_price,
};

/// Decides how much of a trade or a reserve counts as tracked USD.
///
/// Only legs in whitelisted tokens are trusted. Pairs with few liquidity
/// providers must also hold enough whitelisted reserves before their swaps
/// count, which keeps freshly created pairs from inflating volume.
pub struct VolumeCalculator<'a> {
    pricing: &'a PricingConfig,
}

impl<'a> VolumeCalculator<'a> {
    pub fn new(pricing: &'a PricingConfig) -> Self {
        Self { pricing }
    }

    pub fn tracked_volume_usd(
        &self,
        amount0: &BigDecimal,
        token0: &Token,
        amount1: &BigDecimal,
        token1: &Token,
        pair: &Pair,
        eth_price: &BigDecimal,
    ) -> BigDecimal {
        let price0 = &token0.derived_eth * eth_price;
        let price1 = &token1.derived_eth * eth_price;
        let whitelisted0 = self.pricing.is_whitelisted(&token0.id);
        let whitelisted1 = self.pricing.is_whitelisted(&token1.id);

        if pair.liquidity_provider_count < self.pricing.minimum_liquidity_providers {
            let reserve0_usd = &pair.reserve0 * &price0;
            let reserve1_usd = &pair.reserve1 * &price1;
            let threshold = &self.pricing.minimum_usd_threshold_new_pairs;
            let two = BigDecimal::from(2);

            let below_threshold = match (whitelisted0, whitelisted1) {
                (true, true) => &(&reserve0_usd + &reserve1_usd) < threshold,
                (true, false) => &(&reserve0_usd * &two) < threshold,
                (false, true) => &(&reserve1_usd * &two) < threshold,
                (false, false) => false,
            };
            if below_threshold {
                return BigDecimal::zero();
            }
        }

        match (whitelisted0, whitelisted1) {
            (true, true) => {
                round_price((amount0 * &price0 + amount1 * &price1) / BigDecimal::from(2))
            },
            (true, false) => round_price(amount0 * &price0),
            (false, true) => round_price(amount1 * &price1),
            (false, false) => BigDecimal::zero(),
        }
    }

    /// USD value of the whitelisted side of a reserve pair. A single
    /// whitelisted side is doubled to stand in for the whole pool.
    pub fn tracked_liquidity_usd(
        &self,
        amount0: &BigDecimal,
        token0: &Token,
        amount1: &BigDecimal,
        token1: &Token,
        eth_price: &BigDecimal,
    ) -> BigDecimal {
        let price0 = &token0.derived_eth * eth_price;
        let price1 = &token1.derived_eth * eth_price;
        let two = BigDecimal::from(2);

        match (
            self.pricing.is_whitelisted(&token0.id),
            self.pricing.is_whitelisted(&token1.id),
        ) {
            (true, true) => round_price(amount0 * &price0 + amount1 * &price1),
            (true, false) => round_price(amount0 * &price0 * &two),
            (false, true) => round_price(amount1 * &price1 * &two),
            (false, false) => BigDecimal::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::token_metadata::TokenMetadata;
    use chrono::{TimeZone, Utc};
    use std::str::FromStr;

    const WETH: &str = "0x00000000000000000000000000000000000000e1";
    const USDC: &str = "0x00000000000000000000000000000000000000c1";
    const SHIB: &str = "0x00000000000000000000000000000000000000f1";
    const PEPE: &str = "0x00000000000000000000000000000000000000f2";

    fn pricing() -> PricingConfig {
        PricingConfig::new(WETH, USDC, "0xpair", &[WETH, USDC])
    }

    fn token(id: &str, derived_eth: i64) -> Token {
        let mut token = Token::from_metadata(
            id,
            TokenMetadata {
                symbol: "T".to_string(),
                name: "Token".to_string(),
                decimals: 0,
                total_supply: BigDecimal::zero(),
            },
        );
        token.derived_eth = BigDecimal::from(derived_eth);
        token
    }

    fn pair(token0: &str, token1: &str, reserve0: &str, reserve1: &str, providers: i64) -> Pair {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut pair = Pair::new("0xpair", token0, token1, created, 1);
        pair.reserve0 = BigDecimal::from_str(reserve0).unwrap();
        pair.reserve1 = BigDecimal::from_str(reserve1).unwrap();
        pair.liquidity_provider_count = providers;
        pair
    }

    #[test]
    fn test_single_whitelisted_leg_counts_in_full() {
        let pricing = pricing();
        let calculator = VolumeCalculator::new(&pricing);
        let weth = token(WETH, 1);
        let shib = token(SHIB, 0);
        let eth_price = BigDecimal::from(2);

        let tracked = calculator.tracked_volume_usd(
            &BigDecimal::from(10),
            &weth,
            &BigDecimal::from(500),
            &shib,
            &pair(WETH, SHIB, "0", "0", 5),
            &eth_price,
        );
        assert_eq!(tracked, BigDecimal::from(20));
    }

    #[test]
    fn test_both_whitelisted_legs_are_averaged() {
        let pricing = pricing();
        let calculator = VolumeCalculator::new(&pricing);
        let tracked = calculator.tracked_volume_usd(
            &BigDecimal::from(10),
            &token(WETH, 1),
            &BigDecimal::from(30),
            &token(USDC, 1),
            &pair(WETH, USDC, "0", "0", 10),
            &BigDecimal::from(1),
        );
        assert_eq!(tracked, BigDecimal::from(20));
    }

    #[test]
    fn test_new_pair_below_threshold_is_untracked() {
        let pricing = pricing();
        let calculator = VolumeCalculator::new(&pricing);
        let eth_price = BigDecimal::from(2000);

        // One whitelisted side worth 1000 USD, doubled to 2000 < 3000.
        let thin = calculator.tracked_volume_usd(
            &BigDecimal::from(1),
            &token(WETH, 1),
            &BigDecimal::from(1),
            &token(SHIB, 0),
            &pair(WETH, SHIB, "0.5", "10", 1),
            &eth_price,
        );
        assert!(thin.is_zero());

        // Same pair with enough providers skips the check.
        let established = calculator.tracked_volume_usd(
            &BigDecimal::from(1),
            &token(WETH, 1),
            &BigDecimal::from(1),
            &token(SHIB, 0),
            &pair(WETH, SHIB, "0.5", "10", 5),
            &eth_price,
        );
        assert_eq!(established, BigDecimal::from(2000));

        // 2 WETH of reserves is 4000 USD, doubled to 8000 >= 3000.
        let funded = calculator.tracked_volume_usd(
            &BigDecimal::from(1),
            &token(WETH, 1),
            &BigDecimal::from(1),
            &token(SHIB, 0),
            &pair(WETH, SHIB, "2", "10", 1),
            &eth_price,
        );
        assert_eq!(funded, BigDecimal::from(2000));
    }

    #[test]
    fn test_unwhitelisted_pair_is_never_tracked() {
        let pricing = pricing();
        let calculator = VolumeCalculator::new(&pricing);
        let tracked = calculator.tracked_volume_usd(
            &BigDecimal::from(1000),
            &token(SHIB, 1),
            &BigDecimal::from(1000),
            &token(PEPE, 1),
            &pair(SHIB, PEPE, "1000", "1000", 50),
            &BigDecimal::from(2000),
        );
        assert!(tracked.is_zero());
    }

    #[test]
    fn test_tracked_liquidity() {
        let pricing = pricing();
        let calculator = VolumeCalculator::new(&pricing);
        let eth_price = BigDecimal::from(2);

        let both = calculator.tracked_liquidity_usd(
            &BigDecimal::from(3),
            &token(WETH, 1),
            &BigDecimal::from(4),
            &token(USDC, 1),
            &eth_price,
        );
        assert_eq!(both, BigDecimal::from(14));

        let one = calculator.tracked_liquidity_usd(
            &BigDecimal::from(100),
            &token(SHIB, 1),
            &BigDecimal::from(4),
            &token(USDC, 1),
            &eth_price,
        );
        assert_eq!(one, BigDecimal::from(16));

        let none = calculator.tracked_liquidity_usd(
            &BigDecimal::from(100),
            &token(SHIB, 1),
            &BigDecimal::from(4),
            &token(PEPE, 1),
            &eth_price,
        );
        assert!(none.is_zero());
    }
}
