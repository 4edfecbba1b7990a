//! Day and hour snapshots.
//!
//! Each helper copies the current totals of its parent entity into the bucket
//! of the event's timestamp and counts one more transaction. Callers add
//! volume to the returned row and put it back.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};

use super::{
    constants::{SECONDS_PER_DAY, SECONDS_PER_HOUR},
    mapper_context::MapperContext,
};
use crate::{
    db::{
        common::models::{
            Factory, FactoryDayData, Pair, PairDayData, PairHourData, Token, TokenDayData,
        },
        store::Store,
    },
    utils::{decimal::round_price, errors::ProcessorResult, token_metadata::TokenContractReader},
};

/// Days since the unix epoch.
pub fn day_index(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp().div_euclid(SECONDS_PER_DAY)
}

/// Hours since the unix epoch.
pub fn hour_index(timestamp: DateTime<Utc>) -> i64 {
    timestamp.timestamp().div_euclid(SECONDS_PER_HOUR)
}

fn epoch_offset(seconds: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(seconds)
}

pub async fn update_factory_day_data<S: Store, R: TokenContractReader>(
    ctx: &mut MapperContext<'_, S, R>,
    factory: &Factory,
    timestamp: DateTime<Utc>,
) -> ProcessorResult<FactoryDayData> {
    let day = day_index(timestamp);
    let id = day.to_string();
    let mut day_data = ctx
        .load::<FactoryDayData>(&id)
        .await?
        .unwrap_or_else(|| FactoryDayData::new(id, epoch_offset(day * SECONDS_PER_DAY)));

    day_data.total_liquidity_eth = factory.total_liquidity_eth.clone();
    day_data.total_liquidity_usd = factory.total_liquidity_usd.clone();
    day_data.total_volume_eth = factory.total_volume_eth.clone();
    day_data.total_volume_usd = factory.total_volume_usd.clone();
    day_data.tx_count = factory.tx_count;

    ctx.put(day_data.clone());
    Ok(day_data)
}

pub async fn update_pair_day_data<S: Store, R: TokenContractReader>(
    ctx: &mut MapperContext<'_, S, R>,
    pair: &Pair,
    timestamp: DateTime<Utc>,
) -> ProcessorResult<PairDayData> {
    let day = day_index(timestamp);
    let id = format!("{}-{}", pair.id, day);
    let mut day_data = ctx.load::<PairDayData>(&id).await?.unwrap_or_else(|| {
        PairDayData::new(
            id,
            epoch_offset(day * SECONDS_PER_DAY),
            &pair.id,
            &pair.token0_id,
            &pair.token1_id,
        )
    });

    day_data.reserve0 = pair.reserve0.clone();
    day_data.reserve1 = pair.reserve1.clone();
    day_data.total_supply = pair.total_supply.clone();
    day_data.reserve_usd = pair.reserve_usd.clone();
    day_data.daily_txns += 1;

    ctx.put(day_data.clone());
    Ok(day_data)
}

pub async fn update_pair_hour_data<S: Store, R: TokenContractReader>(
    ctx: &mut MapperContext<'_, S, R>,
    pair: &Pair,
    timestamp: DateTime<Utc>,
) -> ProcessorResult<PairHourData> {
    let hour = hour_index(timestamp);
    let id = format!("{}-{}", pair.id, hour);
    let mut hour_data = ctx
        .load::<PairHourData>(&id)
        .await?
        .unwrap_or_else(|| PairHourData::new(id, epoch_offset(hour * SECONDS_PER_HOUR), &pair.id));

    hour_data.reserve0 = pair.reserve0.clone();
    hour_data.reserve1 = pair.reserve1.clone();
    hour_data.total_supply = pair.total_supply.clone();
    hour_data.reserve_usd = pair.reserve_usd.clone();
    hour_data.hourly_txns += 1;

    ctx.put(hour_data.clone());
    Ok(hour_data)
}

pub async fn update_token_day_data<S: Store, R: TokenContractReader>(
    ctx: &mut MapperContext<'_, S, R>,
    token: &Token,
    eth_price: &BigDecimal,
    timestamp: DateTime<Utc>,
) -> ProcessorResult<TokenDayData> {
    let day = day_index(timestamp);
    let id = format!("{}-{}", token.id, day);
    let mut day_data = ctx
        .load::<TokenDayData>(&id)
        .await?
        .unwrap_or_else(|| TokenDayData::new(id, epoch_offset(day * SECONDS_PER_DAY), &token.id));

    let total_liquidity_eth = round_price(&token.total_liquidity * &token.derived_eth);
    day_data.price_usd = round_price(&token.derived_eth * eth_price);
    day_data.total_liquidity_token = token.total_liquidity.clone();
    day_data.total_liquidity_usd = round_price(&total_liquidity_eth * eth_price);
    day_data.total_liquidity_eth = total_liquidity_eth;
    day_data.daily_txns += 1;

    ctx.put(day_data.clone());
    Ok(day_data)
}
