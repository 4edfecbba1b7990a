//! Persistence port.
//!
//! [`Store`] is the key-by-id interface the persistence collaborator
//! implements. Rows are addressed by their [`Entity`] type, so a single
//! generic method covers every table. [`EntityTables`] is the type-keyed arena
//! shared by the in-memory adapter and the batch cache.

use ahash::AHashMap;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;

use crate::db::common::models::{
    Bundle, Burn, Factory, FactoryDayData, LiquidityPosition, Mint, Pair, PairDayData,
    PairHourData, SwapStatPeriod, Swapper, Token, TokenDayData, TokenSwapEvent, Transaction,
};

pub mod memory;

pub use memory::InMemoryStore;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumIter,
)]
pub enum EntityKind {
    Factory,
    Bundle,
    Token,
    Pair,
    LiquidityPosition,
    Transaction,
    Mint,
    Burn,
    TokenSwapEvent,
    FactoryDayData,
    PairDayData,
    PairHourData,
    TokenDayData,
    Swapper,
    SwapStatPeriod,
}

pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;
}

macro_rules! impl_entity {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl Entity for $ty {
                const KIND: EntityKind = EntityKind::$kind;

                fn id(&self) -> &str {
                    &self.id
                }
            }
        )*
    };
}

impl_entity!(
    Factory => Factory,
    Bundle => Bundle,
    Token => Token,
    Pair => Pair,
    LiquidityPosition => LiquidityPosition,
    Transaction => Transaction,
    Mint => Mint,
    Burn => Burn,
    TokenSwapEvent => TokenSwapEvent,
    FactoryDayData => FactoryDayData,
    PairDayData => PairDayData,
    PairHourData => PairHourData,
    TokenDayData => TokenDayData,
    Swapper => Swapper,
    SwapStatPeriod => SwapStatPeriod,
);

#[async_trait]
pub trait Store: Send + Sync {
    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>>;

    /// Rows for the ids that exist; unknown ids are skipped.
    async fn find_by_ids<E: Entity>(&self, ids: &[String]) -> Result<Vec<E>>;

    /// Rows matching `predicate`, ordered by id.
    async fn find<E, F>(&self, predicate: F) -> Result<Vec<E>>
    where
        E: Entity,
        F: Fn(&E) -> bool + Send + Sync + 'static;

    async fn count_by<E, F>(&self, predicate: F) -> Result<usize>
    where
        E: Entity,
        F: Fn(&E) -> bool + Send + Sync + 'static;

    /// Upserts by id.
    async fn save<E: Entity>(&self, entities: Vec<E>) -> Result<()>;

    async fn remove<E: Entity>(&self, ids: Vec<String>) -> Result<()>;

    /// Swaps with `from <= timestamp <= to`. SQL-backed stores run this as a
    /// single range query on the timestamp index.
    async fn swaps_in_window(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<TokenSwapEvent>> {
        self.find::<TokenSwapEvent, _>(move |swap| swap.timestamp >= from && swap.timestamp <= to)
            .await
    }
}

type Table = AHashMap<String, Box<dyn Any + Send + Sync>>;

/// Rows of every entity kind, each table keyed by id.
#[derive(Default)]
pub struct EntityTables {
    tables: AHashMap<EntityKind, Table>,
}

impl EntityTables {
    pub fn get<E: Entity>(&self, id: &str) -> Option<&E> {
        self.tables
            .get(&E::KIND)?
            .get(id)
            .and_then(|row| row.downcast_ref::<E>())
    }

    pub fn contains<E: Entity>(&self, id: &str) -> bool {
        self.get::<E>(id).is_some()
    }

    pub fn insert<E: Entity>(&mut self, entity: E) {
        self.tables
            .entry(E::KIND)
            .or_default()
            .insert(entity.id().to_string(), Box::new(entity));
    }

    pub fn remove<E: Entity>(&mut self, id: &str) -> Option<E> {
        let row = self.tables.get_mut(&E::KIND)?.remove(id)?;
        row.downcast::<E>().ok().map(|row| *row)
    }

    pub fn iter<E: Entity>(&self) -> impl Iterator<Item = &E> + '_ {
        self.tables
            .get(&E::KIND)
            .into_iter()
            .flat_map(|table| table.values())
            .filter_map(|row| (**row).downcast_ref::<E>())
    }

    pub fn len_of(&self, kind: EntityKind) -> usize {
        self.tables.get(&kind).map_or(0, |table| table.len())
    }

    pub fn clear_kind(&mut self, kind: EntityKind) {
        self.tables.remove(&kind);
    }

    pub fn clear(&mut self) {
        self.tables.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_tables_are_separated_by_kind() {
        let mut tables = EntityTables::default();
        tables.insert(Factory::new("0xfactory"));
        tables.insert(Bundle::default());

        assert!(tables.contains::<Factory>("0xfactory"));
        assert!(!tables.contains::<Pair>("0xfactory"));
        assert_eq!(tables.len_of(EntityKind::Bundle), 1);
        assert_eq!(tables.iter::<Factory>().count(), 1);

        let removed = tables.remove::<Factory>("0xfactory").unwrap();
        assert_eq!(removed.id, "0xfactory");
        assert_eq!(tables.len_of(EntityKind::Factory), 0);
    }

    #[test]
    fn test_insert_replaces_by_id() {
        let mut tables = EntityTables::default();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut pair = Pair::new("0xpair", "0xa", "0xb", created, 1);
        tables.insert(pair.clone());
        pair.tx_count = 7;
        tables.insert(pair);

        assert_eq!(tables.len_of(EntityKind::Pair), 1);
        assert_eq!(tables.get::<Pair>("0xpair").unwrap().tx_count, 7);
    }
}
