use crate::chain::ChainSource;
use crate::config::PipelineConfig;
use crate::enricher::enrich_transaction;
use crate::error::Result;
use crate::fetcher::fetch_incoming_blocks;
use crate::holders::aggregate_holders;
use crate::models::{Block, Checkpoint, StateUpdate};
use crate::reorg::{ReorgVerdict, check_checkpoint};
use alloy_primitives::Address;
use futures::{StreamExt, TryStreamExt, stream};
use std::time::Instant;
use tracing::info;

/// Builds one [`StateUpdate`] per call from a caller-supplied checkpoint.
pub struct StateUpdatePipeline<C> {
    chain: C,
    config: PipelineConfig,
}

impl<C: ChainSource> StateUpdatePipeline<C> {
    pub fn new(chain: C, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(StateUpdatePipeline { chain, config })
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Either reports the checkpoint as reorganized, or returns every block
    /// after it (up to the lookup distance) fully enriched.
    pub async fn state_update(&self, checkpoint: &Checkpoint) -> Result<StateUpdate> {
        let start = Instant::now();

        if let ReorgVerdict::Reorganized { reversed } =
            check_checkpoint(&self.chain, checkpoint).await?
        {
            return Ok(StateUpdate::reorganized(reversed));
        }

        let mut blocks =
            fetch_incoming_blocks(&self.chain, checkpoint.block_height, &self.config).await?;

        for block in &mut blocks {
            self.enrich_block(block, checkpoint.token_address).await?;
        }

        if let (Some(first), Some(last)) = (blocks.first(), blocks.last()) {
            info!(
                "State update for blocks {} to {} built in {:?}",
                first.block_height,
                last.block_height,
                start.elapsed()
            );
        }

        Ok(StateUpdate::incoming(blocks))
    }

    async fn enrich_block(&self, block: &mut Block, token_address: Option<Address>) -> Result<()> {
        let transactions = stream::iter(
            block
                .transaction_hashes
                .iter()
                .map(|hash| enrich_transaction(&self.chain, *hash, token_address)),
        )
        .buffered(self.config.transaction_concurrency)
        .try_collect::<Vec<_>>()
        .await?;

        block.transactions = transactions;
        block.holders_update = aggregate_holders(block.transfers())?;

        info!(
            "Block {}: {} transactions, {} holders updated",
            block.block_height,
            block.transactions.len(),
            block.holders_update.len()
        );
        Ok(())
    }
}
