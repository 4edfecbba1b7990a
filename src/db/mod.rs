// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! # Entity Layer
//!
//! Relational entity model of the indexer and the seams to persistence.
//!
//! ## Architecture
//!
//! - **Common models**: one row type per entity kind (tokens, pairs,
//!   transactions, swaps, day snapshots, leaderboards)
//! - **Store port**: the async key-by-id interface implemented by the
//!   persistence collaborator, plus an in-memory adapter
//! - **Batch cache**: per-batch read-through accumulator flushed once per kind
//!
//! ## Entity Kinds
//!
//! - `Factory`, `Bundle`: long-lived singletons
//! - `Token`, `Pair`, `LiquidityPosition`: mutable state driven by pair events
//! - `Transaction`, `Mint`, `Burn`, `TokenSwapEvent`: append-only history
//! - `PairDayData`, `PairHourData`, `TokenDayData`, `FactoryDayData`: snapshots
//! - `Swapper`, `SwapStatPeriod`: rollup output, replaced every cycle

/// Common entity models shared by mappers, rollup and queries
pub mod common;

/// Store port, entity arena and the in-memory adapter
pub mod store;

/// Per-batch entity cache with cross-batch singletons
pub mod cache;
