use ahash::AHashSet;
use anyhow::Result;
use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use tracing::{debug, info};

use super::bucket_calculator::RollupWindows;
use crate::{
    config::processor_config::RollupConfig,
    db::{
        common::models::{SwapPeriod, SwapStatPeriod, Swapper, SwapperType, TokenSwapEvent},
        store::Store,
    },
};

/// Result of aggregating swaps over the rollup windows.
#[derive(Debug, Clone, PartialEq)]
pub struct TopSnapshot {
    /// Keyed by swapper id (user address or pair address).
    pub swappers: BTreeMap<String, Swapper>,
    pub stats: Vec<SwapStatPeriod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollupSummary {
    pub window_end: DateTime<Utc>,
    pub swaps_scanned: usize,
    pub swappers_saved: usize,
    pub swappers_removed: usize,
}

/// Per-swapper USD totals and per-period stats for the given swaps.
///
/// A swap counts towards every window containing its timestamp, for both its
/// buyer and its pair.
pub fn compute_top(swaps: &[TokenSwapEvent], windows: &RollupWindows) -> TopSnapshot {
    let mut swappers: BTreeMap<String, Swapper> = BTreeMap::new();
    let mut stats: Vec<SwapStatPeriod> = SwapPeriod::iter()
        .map(|period| SwapStatPeriod::new(period, windows.start(period), windows.end))
        .collect();

    for swap in swaps {
        for stat in stats.iter_mut() {
            if !windows.contains(stat.period, swap.timestamp) {
                continue;
            }
            stat.swaps_count += 1;
            stat.total_amount_usd += &swap.amount_usd;

            for (id, swapper_type) in [
                (&swap.buyer, SwapperType::User),
                (&swap.pair_id, SwapperType::Pair),
            ] {
                let swapper = swappers
                    .entry(id.clone())
                    .or_insert_with(|| Swapper::new(id.as_str(), swapper_type));
                *swapper.amount_usd_mut(stat.period) += &swap.amount_usd;
            }
        }
    }

    for stat in stats.iter_mut() {
        let period = stat.period;
        let active = |swapper_type: SwapperType| {
            swappers
                .values()
                .filter(|s| s.swapper_type == swapper_type)
                .filter(|s| *s.amount_usd(period) > BigDecimal::zero())
                .count() as i64
        };
        stat.users_count = active(SwapperType::User);
        stat.pairs_count = active(SwapperType::Pair);
    }

    TopSnapshot { swappers, stats }
}

/// Rebuilds every Swapper row and the three SwapStatPeriod rows from the
/// swaps inside the windows ending at `trigger`.
pub async fn run_rollup<S: Store>(store: &S, trigger: DateTime<Utc>) -> Result<RollupSummary> {
    let windows = RollupWindows::ending_at(trigger);
    let swaps = store.swaps_in_window(windows.earliest(), windows.end).await?;
    let snapshot = compute_top(&swaps, &windows);

    let current: AHashSet<String> = snapshot.swappers.keys().cloned().collect();
    let stale: Vec<String> = store
        .find::<Swapper, _>(move |swapper| !current.contains(&swapper.id))
        .await?
        .into_iter()
        .map(|swapper| swapper.id)
        .collect();
    let swappers_removed = stale.len();
    let swappers_saved = snapshot.swappers.len();

    store.remove::<Swapper>(stale).await?;
    store
        .save(snapshot.swappers.into_values().collect::<Vec<_>>())
        .await?;
    store.save(snapshot.stats).await?;

    info!(
        "🏆 Rollup to {}: {} swaps, {} swappers saved, {} removed",
        windows.end, swaps.len(), swappers_saved, swappers_removed
    );

    Ok(RollupSummary {
        window_end: windows.end,
        swaps_scanned: swaps.len(),
        swappers_saved,
        swappers_removed,
    })
}

/// Runs [`run_rollup`] at most once per configured interval.
pub struct TopRollup {
    interval: Duration,
    last_window_end: Option<DateTime<Utc>>,
    initialized: bool,
}

impl TopRollup {
    pub fn new(config: &RollupConfig) -> Self {
        Self {
            interval: Duration::seconds(config.interval_secs),
            last_window_end: None,
            initialized: false,
        }
    }

    pub fn last_window_end(&self) -> Option<DateTime<Utc>> {
        self.last_window_end
    }

    /// `latest` is the newest block timestamp seen so far.
    pub async fn maybe_run<S: Store>(
        &mut self,
        store: &S,
        latest: DateTime<Utc>,
    ) -> Result<Option<RollupSummary>> {
        if !self.initialized {
            // Resume from the last persisted rollup after a restart.
            self.last_window_end = store
                .get::<SwapStatPeriod>(&SwapPeriod::Day.to_string())
                .await?
                .map(|stat| stat.to);
            self.initialized = true;
        }

        if let Some(last) = self.last_window_end {
            if latest < last + self.interval {
                debug!("⏳ Next rollup after {}", last + self.interval);
                return Ok(None);
            }
        }

        let summary = run_rollup(store, latest).await?;
        self.last_window_end = Some(summary.window_end);
        Ok(Some(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::InMemoryStore;
    use chrono::TimeZone;

    fn swap(id: &str, buyer: &str, pair: &str, timestamp: DateTime<Utc>, usd: i64) -> TokenSwapEvent {
        TokenSwapEvent {
            id: id.to_string(),
            transaction_id: id.to_string(),
            timestamp,
            pair_id: pair.to_string(),
            buyer: buyer.to_string(),
            recipient: buyer.to_string(),
            token_sold_id: "0xa".to_string(),
            sold_amount: BigDecimal::from(1),
            token_bought_id: "0xb".to_string(),
            bought_amount: BigDecimal::from(1),
            amount_usd: BigDecimal::from(usd),
            log_index: 0,
        }
    }

    fn end() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 14, 0, 0).unwrap()
    }

    #[test]
    fn test_compute_top_splits_by_window() {
        let windows = RollupWindows::ending_at(end());
        let swaps = vec![
            swap("s1", "0xalice", "0xp1", end() - Duration::hours(1), 100),
            swap("s2", "0xbob", "0xp1", end() - Duration::days(3), 50),
            swap("s3", "0xalice", "0xp2", end() - Duration::days(20), 10),
        ];
        let snapshot = compute_top(&swaps, &windows);

        let alice = &snapshot.swappers["0xalice"];
        assert_eq!(alice.swapper_type, SwapperType::User);
        assert_eq!(alice.day_amount_usd, BigDecimal::from(100));
        assert_eq!(alice.week_amount_usd, BigDecimal::from(100));
        assert_eq!(alice.month_amount_usd, BigDecimal::from(110));

        let p1 = &snapshot.swappers["0xp1"];
        assert_eq!(p1.swapper_type, SwapperType::Pair);
        assert_eq!(p1.week_amount_usd, BigDecimal::from(150));

        let day = &snapshot.stats[0];
        assert_eq!(day.period, SwapPeriod::Day);
        assert_eq!(day.swaps_count, 1);
        assert_eq!(day.users_count, 1);
        assert_eq!(day.pairs_count, 1);
        let month = &snapshot.stats[2];
        assert_eq!(month.swaps_count, 3);
        assert_eq!(month.users_count, 2);
        assert_eq!(month.pairs_count, 2);
        assert_eq!(month.total_amount_usd, BigDecimal::from(160));
    }

    #[tokio::test]
    async fn test_rollup_is_idempotent_and_drops_stale_swappers() {
        let store = InMemoryStore::new();
        store
            .save(vec![
                swap("s1", "0xalice", "0xp1", end() - Duration::hours(2), 100),
                swap("s2", "0xbob", "0xp1", end() - Duration::days(2), 40),
            ])
            .await
            .unwrap();
        store
            .save(vec![Swapper::new("0xgone", SwapperType::User)])
            .await
            .unwrap();

        let first = run_rollup(&store, end()).await.unwrap();
        assert_eq!(first.swappers_removed, 1);
        let swappers_after_first = store.all::<Swapper>().await;
        let stats_after_first = store.all::<SwapStatPeriod>().await;

        let second = run_rollup(&store, end() + Duration::minutes(30)).await.unwrap();
        assert_eq!(second.swappers_removed, 0);
        assert_eq!(store.all::<Swapper>().await, swappers_after_first);
        assert_eq!(store.all::<SwapStatPeriod>().await, stats_after_first);
        assert!(store.get::<Swapper>("0xgone").await.unwrap().is_none());

        // Bob only traded outside the day window.
        let bob = store.get::<Swapper>("0xbob").await.unwrap().unwrap();
        assert!(bob.day_amount_usd.is_zero());
        assert_eq!(bob.week_amount_usd, BigDecimal::from(40));
    }

    #[tokio::test]
    async fn test_rollup_without_swaps_writes_zero_stats() {
        let store = InMemoryStore::new();
        let summary = run_rollup(&store, end()).await.unwrap();
        assert_eq!(summary.swaps_scanned, 0);
        assert_eq!(summary.swappers_saved, 0);

        let windows = RollupWindows::ending_at(end());
        let stats = store.all::<SwapStatPeriod>().await;
        assert_eq!(stats.len(), 3);
        for period in SwapPeriod::iter() {
            let stat = store
                .get::<SwapStatPeriod>(&period.to_string())
                .await
                .unwrap()
                .unwrap();
            assert_eq!(stat.from, windows.start(period));
            assert_eq!(stat.to, end());
            assert_eq!(stat.swaps_count, 0);
            assert_eq!(stat.users_count, 0);
            assert_eq!(stat.pairs_count, 0);
            assert!(stat.total_amount_usd.is_zero());
        }
        assert!(store.all::<Swapper>().await.is_empty());
    }

    #[tokio::test]
    async fn test_maybe_run_respects_interval() {
        let store = InMemoryStore::new();
        let mut rollup = TopRollup::new(&RollupConfig::default());

        assert!(rollup.maybe_run(&store, end()).await.unwrap().is_some());
        assert_eq!(rollup.last_window_end(), Some(end()));
        assert!(rollup
            .maybe_run(&store, end() + Duration::minutes(59))
            .await
            .unwrap()
            .is_none());
        assert!(rollup
            .maybe_run(&store, end() + Duration::hours(1))
            .await
            .unwrap()
            .is_some());

        // A restarted scheduler resumes from the persisted DAY window.
        let mut restarted = TopRollup::new(&RollupConfig::default());
        assert!(restarted
            .maybe_run(&store, end() + Duration::minutes(90))
            .await
            .unwrap()
            .is_none());
    }
}
