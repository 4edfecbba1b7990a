// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! # Utility Functions and Shared Components
//!
//! Helpers shared by the mappers, the price oracle and the rollup.
//!
//! ## Key Components
//!
//! ### Decimal Arithmetic (`decimal`)
//! - Exact conversion of raw on-chain integers into token units
//! - Zero-guarded division with a fixed result scale
//!
//! ### Errors (`errors`)
//! - `ProcessorError`, the error surfaced by a batch
//!
//! ### Token Metadata (`token_metadata`)
//! - Contract reader port for ERC-20 metadata
//! - Legacy `bytes32` fallback for symbol and name

/// Exact decimal helpers for token amounts, prices and USD values
pub mod decimal;

/// Error types for event processing
pub mod errors;

/// ERC-20 metadata lookups with the legacy ABI fallback
pub mod token_metadata;
