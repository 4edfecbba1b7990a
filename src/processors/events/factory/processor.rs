use tracing::{info, warn};

use crate::{
    db::{
        common::models::{Bundle, Factory, Pair, Token, BUNDLE_ID},
        store::Store,
    },
    processors::events::{event_data::EventContext, mapper_context::MapperContext},
    utils::{
        errors::{ProcessorError, ProcessorResult},
        token_metadata::{fetch_token_metadata, TokenContractReader},
    },
};

/// Handles the factory's `PairCreated` event.
pub struct FactoryProcessor;

impl FactoryProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Registers a new pair and any token seen for the first time.
    ///
    /// Token metadata is resolved before anything is written, so a token whose
    /// contract cannot be read leaves no partial state behind.
    pub async fn process_pair_created<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        event: &EventContext,
        token0: &str,
        token1: &str,
        pair_address: &str,
    ) -> ProcessorResult<()> {
        if ctx.load::<Pair>(pair_address).await?.is_some() {
            warn!("⚠️ Pair {} already registered, ignoring replay", pair_address);
            return Ok(());
        }

        let new_token0 = self.load_or_fetch_token(ctx, token0).await?;
        let new_token1 = self.load_or_fetch_token(ctx, token1).await?;

        let config = ctx.config;
        let mut factory = match ctx.load::<Factory>(&config.factory_address).await? {
            Some(factory) => factory,
            None => {
                info!("🏭 Creating factory {}", config.factory_address);
                Factory::new(config.factory_address.as_str())
            },
        };
        factory.pair_count += 1;
        ctx.put(factory);

        if ctx.load::<Bundle>(BUNDLE_ID).await?.is_none() {
            ctx.put(Bundle::default());
        }

        for token in [new_token0, new_token1].into_iter().flatten() {
            info!("🪙 New token {} ({})", token.symbol, token.id);
            ctx.put(token);
        }

        ctx.put(Pair::new(
            pair_address,
            token0,
            token1,
            event.block_timestamp,
            event.block_height,
        ));
        ctx.cache.remember_pair(token0, token1, pair_address);

        info!(
            "🆕 Pair {} created for {} / {} at block {}",
            pair_address, token0, token1, event.block_height
        );
        Ok(())
    }

    /// `None` when the token is already indexed.
    async fn load_or_fetch_token<S: Store, R: TokenContractReader>(
        &self,
        ctx: &mut MapperContext<'_, S, R>,
        address: &str,
    ) -> ProcessorResult<Option<Token>> {
        if ctx.load::<Token>(address).await?.is_some() {
            return Ok(None);
        }

        let metadata = fetch_token_metadata(ctx.token_reader, address)
            .await
            .map_err(|e| ProcessorError::TokenMetadataUnavailable {
                address: address.to_string(),
                reason: format!("{:#}", e),
            })?;
        Ok(Some(Token::from_metadata(address, metadata)))
    }
}

impl Default for FactoryProcessor {
    fn default() -> Self {
        Self::new()
    }
}
