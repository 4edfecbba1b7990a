// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! # AMM Analytics Processor
//!
//! Indexes factory and pair events of a constant-product AMM: prices tokens
//! through whitelisted pairs, tracks USD volume and liquidity, and maintains
//! day/week/month swap leaderboards.

use amm_analytics_processor::server_args::ServerArgs;
use anyhow::Result;
use clap::Parser;

#[cfg(unix)]
#[global_allocator]
static ALLOC: jemallocator::Jemalloc = jemallocator::Jemalloc;

fn main() -> Result<()> {
    let num_cpus = num_cpus::get();
    let worker_threads = num_cpus.max(16);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder
        .enable_all()
        .worker_threads(worker_threads)
        .build()?
        .block_on(async {
            let args = ServerArgs::parse();
            args.run().await
        })
}
