//! Command line entry point: replays a JSON-lines file of decoded logs
//! through the processor against an in-memory store.

use anyhow::{Context, Result};
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    common::{get_processor_status_saver, processor_status_saver::ProcessorStatusSaver},
    config::indexer_processor_config::IndexerProcessorConfig,
    db::{common::models::SwapPeriod, store::InMemoryStore},
    processors::{
        events::event_data::RawEvent,
        rollup::{top_pairs, top_users, TopQuery, TopResponse},
        AmmAnalyticsProcessor,
    },
    utils::token_metadata::StaticTokenReader,
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct ServerArgs {
    #[clap(short, long, value_parser)]
    pub config_path: PathBuf,

    /// JSON-lines file with one raw event per line, in chain order.
    #[clap(short, long, value_parser)]
    pub events_path: PathBuf,

    /// Emit logs as JSON objects.
    #[clap(long, default_value_t = false)]
    pub json_logs: bool,

    /// Leaderboard entries to print after the replay.
    #[clap(long, default_value_t = 10)]
    pub top: usize,
}

impl ServerArgs {
    pub async fn run(self) -> Result<()> {
        init_logging(self.json_logs);

        let config = IndexerProcessorConfig::load(&self.config_path)?;
        let token_reader = match &config.token_metadata_path {
            Some(path) => StaticTokenReader::from_json_file(path)?,
            None => {
                warn!("⚠️ No token_metadata_path configured, every PairCreated will be skipped");
                StaticTokenReader::default()
            },
        };

        let store = Arc::new(InMemoryStore::new());
        let mut processor = AmmAnalyticsProcessor::new(
            store.clone(),
            Arc::new(token_reader),
            config.processor_config.amm().clone(),
        );
        let status_saver = get_processor_status_saver(&config);

        let file = tokio::fs::File::open(&self.events_path)
            .await
            .with_context(|| format!("Failed to open events file {}", self.events_path.display()))?;
        let mut lines = BufReader::new(file).lines();
        let mut batch: Vec<RawEvent> = Vec::with_capacity(config.batch_size);
        let mut line_number = 0usize;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RawEvent>(&line) {
                Ok(event) => batch.push(event),
                Err(e) => warn!("⚠️ Skipping malformed event on line {}: {}", line_number, e),
            }

            if batch.len() >= config.batch_size {
                let summary = processor.process_batch(std::mem::take(&mut batch)).await?;
                if let Some(checkpoint) = &summary.checkpoint {
                    status_saver.save_processor_status(checkpoint).await?;
                }
            }
        }
        if !batch.is_empty() {
            let summary = processor.process_batch(batch).await?;
            if let Some(checkpoint) = &summary.checkpoint {
                status_saver.save_processor_status(checkpoint).await?;
            }
        }

        info!(
            "🏁 Replay finished: {} lines, {} batches committed",
            line_number,
            processor.committed_batches()
        );

        let query = TopQuery {
            limit: Some(self.top),
            range: SwapPeriod::Day,
            ..Default::default()
        };
        log_leaderboard("users", &top_users(store.as_ref(), &query).await?);
        log_leaderboard("pairs", &top_pairs(store.as_ref(), &query).await?);
        Ok(())
    }
}

fn log_leaderboard(kind: &str, response: &TopResponse) {
    info!(
        "🏆 Top {} ({}): {} participants, {} swaps, {} USD",
        kind,
        response.range,
        response.participant_count,
        response.swap_count,
        response.total_amount_usd
    );
    for (rank, entry) in response.entries.iter().enumerate() {
        info!("  #{} {} {} USD", rank + 1, entry.id, entry.amount_usd);
    }
}

/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
