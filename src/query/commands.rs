use crate::chain::ChainSource;
use crate::models::{Checkpoint, StateUpdate, UpdateRequest};
use crate::pipeline::StateUpdatePipeline;
use crate::query::formatters::{OutputFormat, format_state_update};
use anyhow::{Context, Result};

/// Build a checkpoint from either a JSON request body or individual flags.
/// The JSON body wins when both are given.
pub fn resolve_checkpoint(
    request_json: Option<&str>,
    flags: UpdateRequest,
) -> Result<Checkpoint> {
    let request = match request_json {
        Some(body) => serde_json::from_str::<UpdateRequest>(body)
            .context("Request must be a JSON object with blockHeight, blockHash, tokenAddress")?,
        None => flags,
    };
    Ok(Checkpoint::try_from(request)?)
}

pub async fn cmd_state_update<C: ChainSource>(
    pipeline: &StateUpdatePipeline<C>,
    checkpoint: &Checkpoint,
    decimals: u8,
    format: &OutputFormat,
) -> Result<StateUpdate> {
    let update = pipeline.state_update(checkpoint).await?;
    let output = format_state_update(&update, decimals, format);
    println!("{output}");
    Ok(update)
}
