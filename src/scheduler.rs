use crate::chain::ChainSource;
use crate::checkpoint::CheckpointTracker;
use crate::error::StateUpdateError;
use crate::models::{Checkpoint, StateUpdate};
use crate::pipeline::StateUpdatePipeline;
use anyhow::Result;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{error, info, warn};

/// Drives the pipeline from a daemon loop: one run per tick, checkpoint kept
/// in memory, every non-empty update handed to the output channel.
pub struct Scheduler<C> {
    pipeline: StateUpdatePipeline<C>,
    tracker: CheckpointTracker,
    poll_interval: Duration,
    max_retries: usize,
    tx: mpsc::Sender<StateUpdate>,
}

impl<C: ChainSource> Scheduler<C> {
    pub fn new(
        pipeline: StateUpdatePipeline<C>,
        start: Checkpoint,
        history_depth: usize,
        poll_interval: Duration,
        max_retries: usize,
        tx: mpsc::Sender<StateUpdate>,
    ) -> Self {
        Scheduler {
            pipeline,
            tracker: CheckpointTracker::new(start, history_depth),
            poll_interval,
            max_retries,
            tx,
        }
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        self.tracker.checkpoint()
    }

    pub fn pipeline(&self) -> &StateUpdatePipeline<C> {
        &self.pipeline
    }

    /// Run a single tick. Returns whether the chain had anything new.
    pub async fn tick(&mut self) -> Result<bool> {
        let pipeline = &self.pipeline;
        let checkpoint = self.tracker.checkpoint().clone();
        let start = &checkpoint;

        let update = RetryIf::spawn(
            retry_strategy(self.max_retries),
            move || pipeline.state_update(start),
            |e: &StateUpdateError| {
                if e.is_retryable() {
                    warn!("Retrying state update from block {}: {}", start.block_height, e);
                    true
                } else {
                    false
                }
            },
        )
        .await?;

        self.tracker.apply(&update);
        if update.is_empty() {
            return Ok(false);
        }

        info!(
            "Checkpoint moved to block {}",
            self.tracker.checkpoint().block_height
        );
        self.tx
            .send(update)
            .await
            .map_err(|_| anyhow::anyhow!("State update receiver dropped"))?;
        Ok(true)
    }

    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Starting state updates from block {}",
            self.tracker.checkpoint().block_height
        );

        loop {
            match self.tick().await {
                Ok(true) => continue,
                Ok(false) => {
                    info!(
                        "Caught up at block {}. Waiting for new blocks...",
                        self.tracker.checkpoint().block_height
                    );
                }
                Err(e) if self.tx.is_closed() => return Err(e),
                Err(e) => {
                    error!("State update failed: {:#}", e);
                }
            }
            sleep(self.poll_interval).await;
        }
    }
}

fn retry_strategy(max_retries: usize) -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(100)
        .factor(2)
        .max_delay(Duration::from_secs(10))
        .map(jitter)
        .take(max_retries)
}
