use bigdecimal::{BigDecimal, Zero};
use tracing::debug;

use crate::{
    db::{
        common::models::{
            transaction_models::{event_record_id, push_unique},
            Bundle, Burn, Factory, LiquidityPosition, Mint, Pair, Token, TokenSwapEvent,
            Transaction, BUNDLE_ID,
        },
        store::Store,
    },
    processors::events::{
        constants::ADDRESS_ZERO,
        day_data::{
            update_factory_day_data, update_pair_day_data, update_pair_hour_data,
            update_token_day_data,
        },
        event_data::{EventContext, PairEvent, SwapData},
        mapper_context::MapperContext,
        pricing::{find_eth_per_token, get_eth_price_in_usd},
        volume_calculator::VolumeCalculator,
    },
    utils::{
        decimal::{convert_token_to_decimal, round_price, safe_div, LP_TOKEN_DECIMALS},
        errors::ProcessorResult,
        token_metadata::TokenContractReader,
    },
};

/// Pair with both of its tokens, loaded together by most handlers.
struct PairState {
    pair: Pair,
    token0: Token,
    token1: Token,
}

/// Handles the events emitted by pair contracts.
pub struct PairProcessor;

impl PairProcessor {
    pub fn new() -> Self {
        Self
    }

    pub async fn process_event<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
        pair_event: &PairEvent,
    ) -> ProcessorResult<()> {
        match pair_event {
            PairEvent::Transfer { from, to, value } => {
                self.process_transfer(ctx, event, from, to, value).await
            },
            PairEvent::Sync { reserve0, reserve1 } => {
                self.process_sync(ctx, event, reserve0, reserve1).await
            },
            PairEvent::Mint {
                sender,
                amount0,
                amount1,
            } => {
                self.process_mint(ctx, event, sender, amount0, amount1)
                    .await
            },
            PairEvent::Burn {
                sender,
                to,
                amount0,
                amount1,
            } => {
                self.process_burn(ctx, event, sender, to, amount0, amount1)
                    .await
            },
            PairEvent::Swap(swap) => self.process_swap(ctx, event, swap).await,
        }
    }

    /// LP token movement: supply changes on mint/burn transfers and
    /// per-account balances otherwise.
    pub async fn process_transfer<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
        from: &str,
        to: &str,
        value: &BigDecimal,
    ) -> ProcessorResult<()> {
        // The first mint locks MINIMUM_LIQUIDITY at the zero address.
        if to == ADDRESS_ZERO && *value == ctx.config.minimum_liquidity {
            debug!("🔒 Skipping minimum liquidity lock in tx {}", event.tx_hash);
            return Ok(());
        }

        let pair_id = event.contract_address.as_str();
        let mut pair = ctx.require::<Pair>(pair_id).await?;
        self.load_or_create_transaction(ctx, event).await?;

        let amount = convert_token_to_decimal(value, LP_TOKEN_DECIMALS);
        if from == ADDRESS_ZERO {
            pair.total_supply += &amount;
        }
        if to == ADDRESS_ZERO && from == pair_id {
            pair.total_supply -= &amount;
        }

        if from != ADDRESS_ZERO && from != pair_id {
            let mut position = self.load_or_create_position(ctx, &mut pair, from).await?;
            position.liquidity_token_balance -= &amount;
            ctx.put(position);
        }
        if to != ADDRESS_ZERO && to != pair_id {
            let mut position = self.load_or_create_position(ctx, &mut pair, to).await?;
            position.liquidity_token_balance += &amount;
            ctx.put(position);
        }

        ctx.put(pair);
        Ok(())
    }

    /// Replaces the pair's reserves and re-derives every price that depends
    /// on them.
    ///
    /// The pair's previous contribution to token and factory liquidity is
    /// removed before the new one is added, so replaying a sync with the same
    /// reserves leaves the totals unchanged.
    pub async fn process_sync<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
        reserve0: &BigDecimal,
        reserve1: &BigDecimal,
    ) -> ProcessorResult<()> {
        let config = ctx.config;
        let PairState {
            mut pair,
            mut token0,
            mut token1,
        } = self.load_pair_state(ctx, &event.contract_address).await?;
        let mut factory = ctx.require::<Factory>(&config.factory_address).await?;

        factory.total_liquidity_eth -= &pair.tracked_reserve_eth;
        token0.total_liquidity -= &pair.reserve0;
        token1.total_liquidity -= &pair.reserve1;

        pair.reserve0 = convert_token_to_decimal(reserve0, token0.decimals);
        pair.reserve1 = convert_token_to_decimal(reserve1, token1.decimals);
        pair.token0_price = safe_div(&pair.reserve0, &pair.reserve1);
        pair.token1_price = safe_div(&pair.reserve1, &pair.reserve0);
        ctx.put(pair.clone());

        let mut bundle = ctx.require::<Bundle>(BUNDLE_ID).await?;
        bundle.eth_price = get_eth_price_in_usd(ctx).await?;
        ctx.put(bundle.clone());

        // token1 may be priced through token0, so token0 goes back first.
        token0.derived_eth = find_eth_per_token(ctx, &token0.id).await?;
        ctx.put(token0.clone());
        token1.derived_eth = find_eth_per_token(ctx, &token1.id).await?;
        ctx.put(token1.clone());

        let tracked_liquidity_usd = VolumeCalculator::new(&config.pricing).tracked_liquidity_usd(
            &pair.reserve0,
            &token0,
            &pair.reserve1,
            &token1,
            &bundle.eth_price,
        );
        pair.tracked_reserve_eth = safe_div(&tracked_liquidity_usd, &bundle.eth_price);
        pair.reserve_eth = round_price(
            &pair.reserve0 * &token0.derived_eth + &pair.reserve1 * &token1.derived_eth,
        );
        pair.reserve_usd = round_price(&pair.reserve_eth * &bundle.eth_price);

        factory.total_liquidity_eth += &pair.tracked_reserve_eth;
        factory.total_liquidity_usd = round_price(&factory.total_liquidity_eth * &bundle.eth_price);
        token0.total_liquidity += &pair.reserve0;
        token1.total_liquidity += &pair.reserve1;

        debug!(
            "🔄 Sync {}: reserves {} / {}, eth price {}",
            pair.id, pair.reserve0, pair.reserve1, bundle.eth_price
        );

        ctx.put(pair);
        ctx.put(token0);
        ctx.put(token1);
        ctx.put(factory);
        Ok(())
    }

    pub async fn process_mint<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
        sender: &str,
        amount0: &BigDecimal,
        amount1: &BigDecimal,
    ) -> ProcessorResult<()> {
        let (state, factory, amount0, amount1, amount_usd) = self
            .count_liquidity_event(ctx, event, sender, amount0, amount1)
            .await?;

        let id = event_record_id(&event.tx_hash, event.log_index);
        let mut transaction = self.load_or_create_transaction(ctx, event).await?;
        push_unique(&mut transaction.mints, &id);
        ctx.put(transaction);
        ctx.put(Mint {
            id,
            transaction_id: event.tx_hash.clone(),
            timestamp: event.block_timestamp,
            pair_id: state.pair.id.clone(),
            sender: sender.to_string(),
            amount0,
            amount1,
            amount_usd,
            log_index: event.log_index,
        });

        self.refresh_snapshots(ctx, event, &state, &factory).await?;
        Ok(())
    }

    pub async fn process_burn<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
        sender: &str,
        to: &str,
        amount0: &BigDecimal,
        amount1: &BigDecimal,
    ) -> ProcessorResult<()> {
        let (state, factory, amount0, amount1, amount_usd) = self
            .count_liquidity_event(ctx, event, sender, amount0, amount1)
            .await?;

        let id = event_record_id(&event.tx_hash, event.log_index);
        let mut transaction = self.load_or_create_transaction(ctx, event).await?;
        push_unique(&mut transaction.burns, &id);
        ctx.put(transaction);
        ctx.put(Burn {
            id,
            transaction_id: event.tx_hash.clone(),
            timestamp: event.block_timestamp,
            pair_id: state.pair.id.clone(),
            sender: sender.to_string(),
            to: to.to_string(),
            amount0,
            amount1,
            amount_usd,
            log_index: event.log_index,
        });

        self.refresh_snapshots(ctx, event, &state, &factory).await?;
        Ok(())
    }

    /// Counts a swap's volume everywhere it aggregates and records the trade.
    pub async fn process_swap<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
        swap: &SwapData,
    ) -> ProcessorResult<()> {
        let config = ctx.config;
        let PairState {
            mut pair,
            mut token0,
            mut token1,
        } = self.load_pair_state(ctx, &event.contract_address).await?;
        let mut factory = ctx.require::<Factory>(&config.factory_address).await?;
        let bundle = ctx.require::<Bundle>(BUNDLE_ID).await?;
        let eth_price = &bundle.eth_price;

        let amount0_total = convert_token_to_decimal(&swap.amount0_in, token0.decimals)
            + convert_token_to_decimal(&swap.amount0_out, token0.decimals);
        let amount1_total = convert_token_to_decimal(&swap.amount1_in, token1.decimals)
            + convert_token_to_decimal(&swap.amount1_out, token1.decimals);

        let derived_amount_eth = safe_div(
            &(&token1.derived_eth * &amount1_total + &token0.derived_eth * &amount0_total),
            &BigDecimal::from(2),
        );
        let derived_amount_usd = round_price(&derived_amount_eth * eth_price);
        let tracked_amount_usd = VolumeCalculator::new(&config.pricing).tracked_volume_usd(
            &amount0_total,
            &token0,
            &amount1_total,
            &token1,
            &pair,
            eth_price,
        );
        let tracked_amount_eth = safe_div(&tracked_amount_usd, eth_price);

        token0.trade_volume += &amount0_total;
        token0.trade_volume_usd += &tracked_amount_usd;
        token0.untracked_volume_usd += &derived_amount_usd;
        token0.tx_count += 1;
        token1.trade_volume += &amount1_total;
        token1.trade_volume_usd += &tracked_amount_usd;
        token1.untracked_volume_usd += &derived_amount_usd;
        token1.tx_count += 1;

        pair.volume_usd += &tracked_amount_usd;
        pair.volume_token0 += &amount0_total;
        pair.volume_token1 += &amount1_total;
        pair.untracked_volume_usd += &derived_amount_usd;
        pair.tx_count += 1;

        factory.total_volume_usd += &tracked_amount_usd;
        factory.total_volume_eth += &tracked_amount_eth;
        factory.untracked_volume_usd += &derived_amount_usd;
        factory.tx_count += 1;

        ctx.put(pair.clone());
        ctx.put(token0.clone());
        ctx.put(token1.clone());
        ctx.put(factory.clone());

        let id = event_record_id(&event.tx_hash, event.log_index);
        let mut transaction = self.load_or_create_transaction(ctx, event).await?;
        push_unique(&mut transaction.swaps, &id);
        ctx.put(transaction);

        let (token_sold_id, sold_amount) = if swap.amount0_in.is_zero() {
            (&pair.token1_id, &swap.amount1_in)
        } else {
            (&pair.token0_id, &swap.amount0_in)
        };
        let (token_bought_id, bought_amount) = if swap.amount0_out.is_zero() {
            (&pair.token1_id, &swap.amount1_out)
        } else {
            (&pair.token0_id, &swap.amount0_out)
        };
        let amount_usd = if tracked_amount_usd.is_zero() {
            derived_amount_usd.clone()
        } else {
            tracked_amount_usd.clone()
        };
        ctx.put(TokenSwapEvent {
            id,
            transaction_id: event.tx_hash.clone(),
            timestamp: event.block_timestamp,
            pair_id: pair.id.clone(),
            buyer: swap.sender.clone(),
            recipient: swap.to.clone(),
            token_sold_id: token_sold_id.clone(),
            sold_amount: sold_amount.clone(),
            token_bought_id: token_bought_id.clone(),
            bought_amount: bought_amount.clone(),
            amount_usd,
            log_index: event.log_index,
        });

        let state = PairState {
            pair,
            token0,
            token1,
        };
        let timestamp = event.block_timestamp;

        let mut factory_day = update_factory_day_data(ctx, &factory, timestamp).await?;
        factory_day.daily_volume_usd += &tracked_amount_usd;
        factory_day.daily_volume_eth += &tracked_amount_eth;
        factory_day.daily_volume_untracked += &derived_amount_usd;
        ctx.put(factory_day);

        let mut pair_day = update_pair_day_data(ctx, &state.pair, timestamp).await?;
        pair_day.daily_volume_token0 += &amount0_total;
        pair_day.daily_volume_token1 += &amount1_total;
        pair_day.daily_volume_usd += &tracked_amount_usd;
        ctx.put(pair_day);

        let mut pair_hour = update_pair_hour_data(ctx, &state.pair, timestamp).await?;
        pair_hour.hourly_volume_token0 += &amount0_total;
        pair_hour.hourly_volume_token1 += &amount1_total;
        pair_hour.hourly_volume_usd += &tracked_amount_usd;
        ctx.put(pair_hour);

        for (token, amount) in [(&state.token0, &amount0_total), (&state.token1, &amount1_total)] {
            let mut token_day = update_token_day_data(ctx, token, eth_price, timestamp).await?;
            let volume_eth = round_price(amount * &token.derived_eth);
            token_day.daily_volume_token += amount;
            token_day.daily_volume_usd += round_price(&volume_eth * eth_price);
            token_day.daily_volume_eth += volume_eth;
            ctx.put(token_day);
        }

        debug!(
            "💱 Swap {} on {}: tracked {} USD, untracked {} USD",
            event.tx_hash, state.pair.id, tracked_amount_usd, derived_amount_usd
        );
        Ok(())
    }

    /// Shared counting for mints and burns. Returns decimal amounts and their
    /// USD value. The sender gets a position on first sight.
    async fn count_liquidity_event<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
        sender: &str,
        amount0: &BigDecimal,
        amount1: &BigDecimal,
    ) -> ProcessorResult<(PairState, Factory, BigDecimal, BigDecimal, BigDecimal)> {
        let config = ctx.config;
        let mut state = self.load_pair_state(ctx, &event.contract_address).await?;
        let mut factory = ctx.require::<Factory>(&config.factory_address).await?;
        let bundle = ctx.require::<Bundle>(BUNDLE_ID).await?;

        let position = self
            .load_or_create_position(ctx, &mut state.pair, sender)
            .await?;
        ctx.put(position);

        state.pair.tx_count += 1;
        state.token0.tx_count += 1;
        state.token1.tx_count += 1;
        factory.tx_count += 1;

        let amount0 = convert_token_to_decimal(amount0, state.token0.decimals);
        let amount1 = convert_token_to_decimal(amount1, state.token1.decimals);
        let amount_usd = round_price(
            (&state.token0.derived_eth * &amount0 + &state.token1.derived_eth * &amount1)
                * &bundle.eth_price,
        );

        ctx.put(state.pair.clone());
        ctx.put(state.token0.clone());
        ctx.put(state.token1.clone());
        ctx.put(factory.clone());
        Ok((state, factory, amount0, amount1, amount_usd))
    }

    async fn refresh_snapshots<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
        state: &PairState,
        factory: &Factory,
    ) -> ProcessorResult<()> {
        let timestamp = event.block_timestamp;
        let eth_price = ctx.require::<Bundle>(BUNDLE_ID).await?.eth_price;

        update_factory_day_data(ctx, factory, timestamp).await?;
        update_pair_day_data(ctx, &state.pair, timestamp).await?;
        update_pair_hour_data(ctx, &state.pair, timestamp).await?;
        update_token_day_data(ctx, &state.token0, &eth_price, timestamp).await?;
        update_token_day_data(ctx, &state.token1, &eth_price, timestamp).await?;
        Ok(())
    }

    async fn load_pair_state<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        pair_id: &str,
    ) -> ProcessorResult<PairState> {
        let pair = ctx.require::<Pair>(pair_id).await?;
        let token0 = ctx.require::<Token>(&pair.token0_id).await?;
        let token1 = ctx.require::<Token>(&pair.token1_id).await?;
        Ok(PairState {
            pair,
            token0,
            token1,
        })
    }

    async fn load_or_create_transaction<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
    ) -> ProcessorResult<Transaction> {
        if let Some(transaction) = ctx.load::<Transaction>(&event.tx_hash).await? {
            return Ok(transaction);
        }
        let transaction = Transaction::new(
            event.tx_hash.as_str(),
            event.block_height,
            event.block_timestamp,
        );
        ctx.put(transaction.clone());
        Ok(transaction)
    }

    /// Positions are created on first sight; each one counts once towards
    /// the pair's provider count.
    async fn load_or_create_position<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        pair: &mut Pair,
        user: &str,
    ) -> ProcessorResult<LiquidityPosition> {
        let id = LiquidityPosition::position_id(&pair.id, user);
        if let Some(position) = ctx.load::<LiquidityPosition>(&id).await? {
            return Ok(position);
        }
        pair.liquidity_provider_count += 1;
        debug!("👤 New liquidity provider {} on {}", user, pair.id);
        Ok(LiquidityPosition::new(&pair.id, user))
    }
}

impl Default for PairProcessor {
    fn default() -> Self {
        Self::new()
    }
}
