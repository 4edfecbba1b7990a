use ahash::AHashSet;
use std::{collections::BTreeSet, sync::Arc};
use tracing::{debug, error, info, warn};

use crate::{
    common::processor_status_saver::BatchCheckpoint,
    config::processor_config::AmmProcessorConfig,
    db::{
        cache::{EntityCache, EntityRequests, FlushSummary},
        common::models::Pair,
        store::{EntityKind, Store},
    },
    processors::{
        events::{
            constants::PAIR_CREATED_EVENT,
            event_data::{decode_pair_created, decode_pair_event, DecodedEvent, RawEvent},
            factory::FactoryProcessor,
            mapper_context::MapperContext,
            pair::PairProcessor,
        },
        rollup::{RollupSummary, TopRollup},
    },
    utils::{
        errors::{ProcessorError, ProcessorResult},
        token_metadata::TokenContractReader,
    },
};

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchSummary {
    pub events_received: usize,
    pub events_mapped: usize,
    /// Events from contracts or with names the indexer does not track.
    pub events_ignored: usize,
    pub decode_failures: usize,
    /// Events dropped by an event-scoped error such as unreadable token
    /// metadata.
    pub events_skipped: usize,
    pub flushed: FlushSummary,
    pub rollup: Option<RollupSummary>,
    pub checkpoint: Option<BatchCheckpoint>,
}

/// Turns batches of raw factory and pair logs into entity updates.
///
/// A batch is routed, decoded, prefetched, mapped event by event in order,
/// and flushed to the store as a unit. If anything other than a single bad
/// event fails before the flush, the cached state is dropped and the error
/// returned so the same batch can be retried from the last committed state.
/// The leaderboard rollup runs after the flush and never fails the batch.
pub struct AmmAnalyticsProcessor<S: Store, R: TokenContractReader> {
    store: Arc<S>,
    token_reader: Arc<R>,
    config: AmmProcessorConfig,
    cache: EntityCache,
    known_pairs: AHashSet<String>,
    factory_processor: FactoryProcessor,
    pair_processor: PairProcessor,
    top_rollup: TopRollup,
}

impl<S: Store, R: TokenContractReader> AmmAnalyticsProcessor<S, R> {
    pub fn new(store: Arc<S>, token_reader: Arc<R>, config: AmmProcessorConfig) -> Self {
        info!(
            "🚀 Creating AmmAnalyticsProcessor for factory {} ({} whitelisted tokens)",
            config.factory_address,
            config.pricing.whitelist.len()
        );
        let top_rollup = TopRollup::new(&config.rollup);
        Self {
            store,
            token_reader,
            config,
            cache: EntityCache::new(),
            known_pairs: AHashSet::new(),
            factory_processor: FactoryProcessor::new(),
            pair_processor: PairProcessor::new(),
            top_rollup,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &AmmProcessorConfig {
        &self.config
    }

    /// Number of batches committed so far.
    pub fn committed_batches(&self) -> u64 {
        self.cache.version()
    }

    pub async fn process_batch(&mut self, events: Vec<RawEvent>) -> ProcessorResult<BatchSummary> {
        match self.try_process_batch(events).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!("❌ Batch failed, discarding cached state: {}", e);
                self.cache.rollback();
                self.known_pairs.clear();
                Err(e)
            },
        }
    }

    async fn try_process_batch(&mut self, events: Vec<RawEvent>) -> ProcessorResult<BatchSummary> {
        let mut summary = BatchSummary {
            events_received: events.len(),
            ..Default::default()
        };
        if events.is_empty() {
            debug!("📭 Empty batch");
            return Ok(summary);
        }

        info!("🔥 Processing batch of {} events", events.len());

        let decoded = self.route_and_decode(&events, &mut summary).await?;
        self.prefetch(&decoded).await?;
        self.map_events(&decoded, &mut summary).await?;

        summary.flushed = self.cache.flush(self.store.as_ref()).await?;

        // The batch is committed. A failed rollup leaves the gate in place
        // and the next batch runs it again.
        if let Some(latest) = events.iter().map(|e| e.block_timestamp).max() {
            match self.top_rollup.maybe_run(self.store.as_ref(), latest).await {
                Ok(rollup) => summary.rollup = rollup,
                Err(e) => error!("❌ Rollup failed, retrying with the next batch: {:#}", e),
            }
        }

        summary.checkpoint = Some(BatchCheckpoint {
            first_block_height: events.iter().map(|e| e.block_height).min().unwrap_or_default(),
            last_block_height: events.iter().map(|e| e.block_height).max().unwrap_or_default(),
            last_block_timestamp: events
                .iter()
                .map(|e| e.block_timestamp)
                .max()
                .unwrap_or_default(),
            events_in_batch: events.len(),
        });

        info!(
            "✅ Batch done: {} mapped, {} ignored, {} undecodable, {} skipped",
            summary.events_mapped,
            summary.events_ignored,
            summary.decode_failures,
            summary.events_skipped
        );
        Ok(summary)
    }

    /// Keeps factory `PairCreated` logs and logs of known pairs, decoded.
    async fn route_and_decode(
        &mut self,
        events: &[RawEvent],
        summary: &mut BatchSummary,
    ) -> ProcessorResult<Vec<DecodedEvent>> {
        let mut decoded = Vec::with_capacity(events.len());
        let mut unknown_contracts: AHashSet<String> = AHashSet::new();

        for raw in events {
            let address = raw.contract_address.to_lowercase();

            let result = if address == self.config.factory_address {
                if raw.event_name != PAIR_CREATED_EVENT {
                    summary.events_ignored += 1;
                    continue;
                }
                decode_pair_created(raw).map(Some)
            } else if !unknown_contracts.contains(&address) && self.is_known_pair(&address).await? {
                decode_pair_event(raw)
            } else {
                unknown_contracts.insert(address);
                summary.events_ignored += 1;
                continue;
            };

            match result {
                Ok(Some(event)) => {
                    if let DecodedEvent::PairCreated { pair, .. } = &event {
                        // Later events of this batch may come from the new pair.
                        self.known_pairs.insert(pair.clone());
                        unknown_contracts.remove(pair);
                    }
                    decoded.push(event);
                },
                Ok(None) => summary.events_ignored += 1,
                Err(e) => {
                    let error = ProcessorError::DecodeError {
                        event_name: raw.event_name.clone(),
                        tx_hash: raw.tx_hash.clone(),
                        message: format!("{:#}", e),
                    };
                    warn!("⚠️ {}", error);
                    summary.decode_failures += 1;
                },
            }
        }

        Ok(decoded)
    }

    async fn is_known_pair(&mut self, address: &str) -> ProcessorResult<bool> {
        if self.known_pairs.contains(address) {
            return Ok(true);
        }
        let id = address.to_string();
        let count = self
            .store
            .count_by::<Pair, _>(move |pair| pair.id == id)
            .await?;
        if count > 0 {
            self.known_pairs.insert(address.to_string());
        }
        Ok(count > 0)
    }

    /// Loads every row the batch reads by id before mapping starts. Tokens
    /// are only known once their pairs are loaded, so they come second.
    async fn prefetch(&mut self, decoded: &[DecodedEvent]) -> ProcessorResult<()> {
        let mut requests = EntityRequests::new();
        for event in decoded {
            event.add_requests(&self.config.factory_address, &mut requests);
        }
        self.cache
            .prefetch_requests(self.store.as_ref(), &requests)
            .await?;

        let pair_tokens: BTreeSet<String> = decoded
            .iter()
            .filter_map(|event| match event {
                DecodedEvent::Pair { context, .. } => {
                    self.cache.get::<Pair>(&context.contract_address)
                },
                DecodedEvent::PairCreated { .. } => None,
            })
            .flat_map(|pair| [pair.token0_id.clone(), pair.token1_id.clone()])
            .collect();
        if !pair_tokens.is_empty() {
            let mut token_requests = EntityRequests::new();
            token_requests.insert(EntityKind::Token, pair_tokens);
            self.cache
                .prefetch_requests(self.store.as_ref(), &token_requests)
                .await?;
        }
        Ok(())
    }

    async fn map_events(
        &mut self,
        decoded: &[DecodedEvent],
        summary: &mut BatchSummary,
    ) -> ProcessorResult<()> {
        let mut failed_pairs: AHashSet<String> = AHashSet::new();
        let mut ctx = MapperContext::new(
            &mut self.cache,
            self.store.as_ref(),
            self.token_reader.as_ref(),
            &self.config,
        );

        for event in decoded {
            let result = match event {
                DecodedEvent::PairCreated {
                    context,
                    token0,
                    token1,
                    pair,
                } => {
                    self.factory_processor
                        .process_pair_created(&mut ctx, context, token0, token1, pair)
                        .await
                },
                DecodedEvent::Pair { context, event: pair_event } => {
                    if failed_pairs.contains(&context.contract_address) {
                        debug!(
                            "⏭️ Skipping {} for unregistered pair {}",
                            event.name(),
                            context.contract_address
                        );
                        summary.events_skipped += 1;
                        continue;
                    }
                    self.pair_processor
                        .process_event(&mut ctx, context, pair_event)
                        .await
                },
            };

            match result {
                Ok(()) => summary.events_mapped += 1,
                Err(e) if e.is_event_scoped() => {
                    warn!(
                        "⚠️ Skipping {} in tx {}: {}",
                        event.name(),
                        event.context().tx_hash,
                        e
                    );
                    if let DecodedEvent::PairCreated { pair, .. } = event {
                        failed_pairs.insert(pair.clone());
                        self.known_pairs.remove(pair);
                    }
                    summary.events_skipped += 1;
                },
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}
