use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::db::{
    common::models::{
        Bundle, Burn, Factory, FactoryDayData, LiquidityPosition, Mint, Pair, PairDayData,
        PairHourData, Token, TokenDayData, TokenSwapEvent, Transaction,
    },
    store::{Entity, EntityKind, EntityTables, Store},
};

/// Kinds that survive batch boundaries.
const LONG_LIVED_KINDS: [EntityKind; 2] = [EntityKind::Factory, EntityKind::Bundle];

/// Ids requested by the events of a batch, grouped by kind.
pub type EntityRequests = BTreeMap<EntityKind, BTreeSet<String>>;

/// Rows written by one flush, per kind.
pub type FlushSummary = BTreeMap<EntityKind, usize>;

/// Per-batch entity accumulator.
///
/// Mappers read through the cache with [`EntityCache::load`] and write back
/// with [`EntityCache::put`]; the cache holds the only mutable copy of every
/// row it has seen, so later mappers observe earlier writes. [`flush`]
/// persists each dirty kind with one `save` call and then drops everything but
/// the factory and bundle rows, whose `version` counts committed batches.
///
/// [`flush`]: EntityCache::flush
#[derive(Default)]
pub struct EntityCache {
    entities: EntityTables,
    dirty: AHashMap<EntityKind, BTreeSet<String>>,
    absent: AHashSet<(EntityKind, String)>,
    /// Pair id by unordered token pair. Pair tokens never change.
    pair_lookup: AHashMap<(String, String), String>,
    version: u64,
}

fn token_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of batches committed through this cache.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Read-through lookup: cache first, then the store (populating the cache).
    pub async fn load<E: Entity, S: Store>(&mut self, store: &S, id: &str) -> Result<Option<E>> {
        if let Some(entity) = self.entities.get::<E>(id) {
            return Ok(Some(entity.clone()));
        }
        if self.absent.contains(&(E::KIND, id.to_string())) {
            return Ok(None);
        }

        match store.get::<E>(id).await? {
            Some(entity) => {
                self.entities.insert(entity.clone());
                Ok(Some(entity))
            },
            None => {
                self.absent.insert((E::KIND, id.to_string()));
                Ok(None)
            },
        }
    }

    /// Stages `entity` for the next flush, replacing any cached copy.
    pub fn put<E: Entity>(&mut self, entity: E) {
        let id = entity.id().to_string();
        self.absent.remove(&(E::KIND, id.clone()));
        self.dirty.entry(E::KIND).or_default().insert(id);
        self.entities.insert(entity);
    }

    pub fn get<E: Entity>(&self, id: &str) -> Option<&E> {
        self.entities.get::<E>(id)
    }

    /// Cached rows of kind `E`, in no particular order.
    pub fn cached<E: Entity>(&self) -> impl Iterator<Item = &E> + '_ {
        self.entities.iter::<E>()
    }

    pub fn remember_pair(&mut self, token_a: &str, token_b: &str, pair_id: &str) {
        self.pair_lookup
            .insert(token_key(token_a, token_b), pair_id.to_string());
    }

    /// Id of the pair joining `token_a` and `token_b`, in either order.
    pub fn pair_for_tokens(&self, token_a: &str, token_b: &str) -> Option<&str> {
        self.pair_lookup
            .get(&token_key(token_a, token_b))
            .map(String::as_str)
    }

    /// Loads the rows for `ids` that are not cached yet with one store call.
    pub async fn prefetch<E: Entity, S: Store>(&mut self, store: &S, ids: &[String]) -> Result<()> {
        let missing: Vec<String> = ids
            .iter()
            .filter(|id| {
                !self.entities.contains::<E>(id) && !self.absent.contains(&(E::KIND, id.to_string()))
            })
            .cloned()
            .collect();
        if missing.is_empty() {
            return Ok(());
        }

        let found = store.find_by_ids::<E>(&missing).await?;
        debug!(
            "🔥 Prefetched {}/{} {} rows",
            found.len(),
            missing.len(),
            E::KIND
        );
        let found_ids: AHashSet<String> = found.iter().map(|e| e.id().to_string()).collect();
        for entity in found {
            self.entities.insert(entity);
        }
        for id in missing {
            if !found_ids.contains(&id) {
                self.absent.insert((E::KIND, id));
            }
        }
        Ok(())
    }

    /// Prefetches every requested kind. Kinds the mappers never request by id
    /// are ignored.
    pub async fn prefetch_requests<S: Store>(
        &mut self,
        store: &S,
        requests: &EntityRequests,
    ) -> Result<()> {
        for (kind, ids) in requests {
            let ids: Vec<String> = ids.iter().cloned().collect();
            match kind {
                EntityKind::Factory => self.prefetch::<Factory, S>(store, &ids).await?,
                EntityKind::Bundle => self.prefetch::<Bundle, S>(store, &ids).await?,
                EntityKind::Token => self.prefetch::<Token, S>(store, &ids).await?,
                EntityKind::Pair => self.prefetch::<Pair, S>(store, &ids).await?,
                EntityKind::LiquidityPosition => {
                    self.prefetch::<LiquidityPosition, S>(store, &ids).await?
                },
                EntityKind::Transaction => self.prefetch::<Transaction, S>(store, &ids).await?,
                other => debug!("⏭️ No prefetch for {}", other),
            }
        }
        Ok(())
    }

    /// Persists every dirty row, one `save` per kind, then starts a new batch.
    pub async fn flush<S: Store>(&mut self, store: &S) -> Result<FlushSummary> {
        let mut summary = FlushSummary::new();

        self.flush_kind::<Factory, S>(store, &mut summary).await?;
        self.flush_kind::<Bundle, S>(store, &mut summary).await?;
        self.flush_kind::<Token, S>(store, &mut summary).await?;
        self.flush_kind::<Pair, S>(store, &mut summary).await?;
        self.flush_kind::<LiquidityPosition, S>(store, &mut summary).await?;
        self.flush_kind::<Transaction, S>(store, &mut summary).await?;
        self.flush_kind::<Mint, S>(store, &mut summary).await?;
        self.flush_kind::<Burn, S>(store, &mut summary).await?;
        self.flush_kind::<TokenSwapEvent, S>(store, &mut summary).await?;
        self.flush_kind::<FactoryDayData, S>(store, &mut summary).await?;
        self.flush_kind::<PairDayData, S>(store, &mut summary).await?;
        self.flush_kind::<PairHourData, S>(store, &mut summary).await?;
        self.flush_kind::<TokenDayData, S>(store, &mut summary).await?;

        self.end_batch();
        self.version += 1;

        info!(
            "✅ Flushed {} rows across {} entity kinds (cache version {})",
            summary.values().sum::<usize>(),
            summary.len(),
            self.version
        );
        Ok(summary)
    }

    async fn flush_kind<E: Entity, S: Store>(
        &mut self,
        store: &S,
        summary: &mut FlushSummary,
    ) -> Result<()> {
        let Some(ids) = self.dirty.remove(&E::KIND) else {
            return Ok(());
        };
        let rows: Vec<E> = ids
            .iter()
            .filter_map(|id| self.entities.get::<E>(id).cloned())
            .collect();
        if rows.is_empty() {
            return Ok(());
        }

        summary.insert(E::KIND, rows.len());
        store.save(rows).await
    }

    fn end_batch(&mut self) {
        let kinds: Vec<EntityKind> = <EntityKind as strum::IntoEnumIterator>::iter()
            .filter(|kind| !LONG_LIVED_KINDS.contains(kind))
            .collect();
        for kind in kinds {
            self.entities.clear_kind(kind);
        }
        self.dirty.clear();
        self.absent.clear();
    }

    /// Drops every cached row, singletons included, so that a retried batch
    /// starts again from the last committed store state.
    pub fn rollback(&mut self) {
        self.entities.clear();
        self.dirty.clear();
        self.absent.clear();
        self.pair_lookup.clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.values().any(|ids| !ids.is_empty())
    }
}
