// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! # Configuration Management
//!
//! Deployment-specific settings of the processor.
//!
//! ## Configuration Structure
//!
//! - **IndexerProcessorConfig**: top-level container loaded from a JSON file
//! - **ProcessorConfig**: processor type plus the AMM deployment settings
//! - **PricingConfig**: reference tokens, whitelist and anti-manipulation thresholds
//! - **RollupConfig**: leaderboard refresh interval
//!
//! ## Validation
//!
//! Values are checked once at startup:
//! - Addresses are normalized to lowercase
//! - The whitelist is non-empty and contains the wrapped native token
//! - The rollup interval is positive

/// Top-level indexer configuration and file loading
pub mod indexer_processor_config;

/// Processor type definitions and AMM deployment settings
pub mod processor_config;
