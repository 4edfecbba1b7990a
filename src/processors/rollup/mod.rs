//! Swap leaderboards.
//!
//! `top_rollup` periodically rebuilds the Swapper and SwapStatPeriod tables
//! from recent swaps; `leaderboard` serves ranked, paged reads of them.

pub mod bucket_calculator;
pub mod leaderboard;
pub mod top_rollup;

pub use leaderboard::{top_pairs, top_users, SortOrder, TopEntry, TopQuery, TopResponse};
pub use top_rollup::{RollupSummary, TopRollup};
