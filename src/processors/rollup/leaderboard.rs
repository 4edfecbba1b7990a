use anyhow::Result;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{
    common::models::{SwapPeriod, SwapStatPeriod, Swapper, SwapperType},
    store::Store,
};

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TopQuery {
    /// `None` returns every ranked swapper.
    pub limit: Option<usize>,
    pub offset: usize,
    pub order: SortOrder,
    pub range: SwapPeriod,
}

impl Default for TopQuery {
    fn default() -> Self {
        Self {
            limit: None,
            offset: 0,
            order: SortOrder::Desc,
            range: SwapPeriod::Day,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TopEntry {
    pub id: String,
    pub amount_usd: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TopResponse {
    pub range: SwapPeriod,
    /// Unset until the first rollup has run.
    pub window_start: Option<DateTime<Utc>>,
    pub window_end: Option<DateTime<Utc>>,
    /// Users or pairs with volume in the window, before paging.
    pub participant_count: i64,
    pub swap_count: i64,
    pub total_amount_usd: BigDecimal,
    pub entries: Vec<TopEntry>,
}

pub async fn top_users<S: Store>(store: &S, query: &TopQuery) -> Result<TopResponse> {
    top_swappers(store, SwapperType::User, query).await
}

pub async fn top_pairs<S: Store>(store: &S, query: &TopQuery) -> Result<TopResponse> {
    top_swappers(store, SwapperType::Pair, query).await
}

async fn top_swappers<S: Store>(
    store: &S,
    swapper_type: SwapperType,
    query: &TopQuery,
) -> Result<TopResponse> {
    let range = query.range;
    let Some(stat) = store.get::<SwapStatPeriod>(&range.to_string()).await? else {
        return Ok(TopResponse {
            range,
            window_start: None,
            window_end: None,
            participant_count: 0,
            swap_count: 0,
            total_amount_usd: BigDecimal::zero(),
            entries: Vec::new(),
        });
    };

    let mut entries: Vec<TopEntry> = store
        .find::<Swapper, _>(move |swapper| {
            swapper.swapper_type == swapper_type && *swapper.amount_usd(range) > BigDecimal::zero()
        })
        .await?
        .into_iter()
        .map(|swapper| TopEntry {
            amount_usd: swapper.amount_usd(range).clone(),
            id: swapper.id,
        })
        .collect();

    // Ties always break by id so pages are stable.
    entries.sort_by(|a, b| {
        let by_amount = match query.order {
            SortOrder::Asc => a.amount_usd.cmp(&b.amount_usd),
            SortOrder::Desc => b.amount_usd.cmp(&a.amount_usd),
        };
        by_amount.then_with(|| a.id.cmp(&b.id))
    });
    let entries = entries
        .into_iter()
        .skip(query.offset)
        .take(query.limit.unwrap_or(usize::MAX))
        .collect();

    let participant_count = match swapper_type {
        SwapperType::User => stat.users_count,
        SwapperType::Pair => stat.pairs_count,
    };

    Ok(TopResponse {
        range,
        window_start: Some(stat.from),
        window_end: Some(stat.to),
        participant_count,
        swap_count: stat.swaps_count,
        total_amount_usd: stat.total_amount_usd,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::InMemoryStore;
    use chrono::TimeZone;

    fn user(id: &str, day: i64, week: i64) -> Swapper {
        let mut swapper = Swapper::new(id, SwapperType::User);
        swapper.day_amount_usd = BigDecimal::from(day);
        swapper.week_amount_usd = BigDecimal::from(week);
        swapper.month_amount_usd = BigDecimal::from(week);
        swapper
    }

    async fn seeded_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        let to = Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap();
        let mut day = SwapStatPeriod::new(SwapPeriod::Day, to - SwapPeriod::Day.duration(), to);
        day.swaps_count = 4;
        day.users_count = 3;
        day.pairs_count = 1;
        day.total_amount_usd = BigDecimal::from(60);
        store.save(vec![day]).await.unwrap();
        store
            .save(vec![
                user("0xc", 10, 10),
                user("0xa", 20, 20),
                user("0xb", 30, 30),
                user("0xd", 0, 5),
                Swapper::new("0xpair", SwapperType::Pair),
            ])
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_top_users_orders_and_pages() {
        let store = seeded_store().await;

        let all = top_users(&store, &TopQuery::default()).await.unwrap();
        let ids: Vec<&str> = all.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["0xb", "0xa", "0xc"]);
        assert_eq!(all.participant_count, 3);
        assert_eq!(all.swap_count, 4);
        assert_eq!(all.total_amount_usd, BigDecimal::from(60));

        let page = top_users(
            &store,
            &TopQuery {
                limit: Some(1),
                offset: 1,
                order: SortOrder::Asc,
                range: SwapPeriod::Day,
            },
        )
        .await
        .unwrap();
        assert_eq!(page.entries.len(), 1);
        assert_eq!(page.entries[0].id, "0xa");
    }

    #[tokio::test]
    async fn test_ties_break_by_id() {
        let store = seeded_store().await;
        store.save(vec![user("0x9", 20, 20)]).await.unwrap();

        let top = top_users(&store, &TopQuery::default()).await.unwrap();
        let ids: Vec<&str> = top.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["0xb", "0x9", "0xa", "0xc"]);
    }

    #[tokio::test]
    async fn test_missing_rollup_returns_empty_window() {
        let store = seeded_store().await;
        let week = top_pairs(
            &store,
            &TopQuery {
                range: SwapPeriod::Week,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(week.window_start.is_none());
        assert!(week.entries.is_empty());
    }
}
