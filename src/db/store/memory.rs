use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Entity, EntityTables, Store};

/// Process-local [`Store`] used by the replay binary and the tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<EntityTables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len<E: Entity>(&self) -> usize {
        self.tables.read().await.len_of(E::KIND)
    }

    /// Every row of kind `E`, ordered by id.
    pub async fn all<E: Entity>(&self) -> Vec<E> {
        let tables = self.tables.read().await;
        let mut rows: Vec<E> = tables.iter::<E>().cloned().collect();
        rows.sort_by(|a, b| a.id().cmp(b.id()));
        rows
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        Ok(self.tables.read().await.get::<E>(id).cloned())
    }

    async fn find_by_ids<E: Entity>(&self, ids: &[String]) -> Result<Vec<E>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.get::<E>(id).cloned())
            .collect())
    }

    async fn find<E, F>(&self, predicate: F) -> Result<Vec<E>>
    where
        E: Entity,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let tables = self.tables.read().await;
        let mut rows: Vec<E> = tables
            .iter::<E>()
            .filter(|row| predicate(*row))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(rows)
    }

    async fn count_by<E, F>(&self, predicate: F) -> Result<usize>
    where
        E: Entity,
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        let tables = self.tables.read().await;
        Ok(tables.iter::<E>().filter(|row| predicate(*row)).count())
    }

    async fn save<E: Entity>(&self, entities: Vec<E>) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let mut tables = self.tables.write().await;
        debug!("💾 Saving {} {} rows", entities.len(), E::KIND);
        for entity in entities {
            tables.insert(entity);
        }
        Ok(())
    }

    async fn remove<E: Entity>(&self, ids: Vec<String>) -> Result<()> {
        let mut tables = self.tables.write().await;
        for id in &ids {
            tables.remove::<E>(id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::common::models::{SwapperType, Swapper, TokenSwapEvent};
    use bigdecimal::BigDecimal;
    use chrono::{Duration, TimeZone, Utc};

    fn swap(id: &str, minutes: i64) -> TokenSwapEvent {
        TokenSwapEvent {
            id: id.to_string(),
            transaction_id: "0xtx".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes),
            pair_id: "0xpair".to_string(),
            buyer: "0xuser".to_string(),
            recipient: "0xuser".to_string(),
            token_sold_id: "0xa".to_string(),
            sold_amount: BigDecimal::from(1),
            token_bought_id: "0xb".to_string(),
            bought_amount: BigDecimal::from(1),
            amount_usd: BigDecimal::from(10),
            log_index: 0,
        }
    }

    #[tokio::test]
    async fn test_save_get_remove() {
        let store = InMemoryStore::new();
        store
            .save(vec![
                Swapper::new("0xb", SwapperType::User),
                Swapper::new("0xa", SwapperType::Pair),
            ])
            .await
            .unwrap();

        assert_eq!(store.len::<Swapper>().await, 2);
        let found = store.get::<Swapper>("0xa").await.unwrap().unwrap();
        assert_eq!(found.swapper_type, SwapperType::Pair);

        let users = store
            .find::<Swapper, _>(|s| s.swapper_type == SwapperType::User)
            .await
            .unwrap();
        assert_eq!(users.len(), 1);

        store.remove::<Swapper>(vec!["0xa".to_string()]).await.unwrap();
        assert!(store.get::<Swapper>("0xa").await.unwrap().is_none());
        assert_eq!(
            store.count_by::<Swapper, _>(|_| true).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_swaps_in_window_is_inclusive() {
        let store = InMemoryStore::new();
        store
            .save(vec![swap("0xtx-0", 0), swap("0xtx-1", 60), swap("0xtx-2", 121)])
            .await
            .unwrap();

        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = from + Duration::hours(1);
        let swaps = store.swaps_in_window(from, to).await.unwrap();
        let ids: Vec<&str> = swaps.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["0xtx-0", "0xtx-1"]);
    }
}
