// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! # Event Processors
//!
//! ## Main Components
//!
//! ### `amm_processor`
//! The batch orchestrator. It routes raw logs by contract address, decodes
//! them, prefetches the entities they touch, runs the mappers in log order,
//! flushes the cache and triggers the leaderboard rollup.
//!
//! ### `events`
//! Decoding plus the factory and pair mappers, the whitelist price oracle
//! and the tracked volume policy.
//!
//! ### `rollup`
//! Day/week/month Swapper leaderboards and their query API.
//!
//! ## Data Flow
//!
//! ```text
//! Raw logs → AmmAnalyticsProcessor → Factory/Pair processors → EntityCache
//!                                                                 ↓ flush
//!                         Leaderboards ← TopRollup ←────────── Store
//! ```

pub mod amm_processor;
pub mod events;
pub mod rollup;

pub use amm_processor::{AmmAnalyticsProcessor, BatchSummary};
