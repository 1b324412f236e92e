use crate::chain::{ChainSource, NativeBlock};
use crate::config::PipelineConfig;
use crate::error::{Result, StateUpdateError};
use crate::models::Block;
use alloy_primitives::B256;
use chrono::DateTime;
use futures::future::try_join_all;
use serde_json::Value;
use std::str::FromStr;
use tokio::time::timeout;
use tracing::{debug, info};

/// Fetch the blocks after `since`, at most `max_lookup_distance` of them.
///
/// All heights are requested at once under a single deadline. Blocks come back
/// in ascending height order. A timeout fails the whole range.
pub async fn fetch_incoming_blocks<C: ChainSource>(
    chain: &C,
    since: u64,
    config: &PipelineConfig,
) -> Result<Vec<Block>> {
    let tip = chain.current_height().await?;
    let window = config.max_lookup_distance.min(tip.saturating_sub(since));

    if window == 0 {
        debug!("No new blocks after {} (tip {})", since, tip);
        return Ok(Vec::new());
    }

    let from = since + 1;
    let to = since + window;
    info!("Fetching blocks {} to {} (tip {})", from, to, tip);

    let fetches = (from..=to).map(|height| fetch_block(chain, height));
    timeout(config.block_fetch_timeout, try_join_all(fetches))
        .await
        .map_err(|_| StateUpdateError::Timeout {
            from,
            to,
            timeout: config.block_fetch_timeout,
        })?
}

async fn fetch_block<C: ChainSource>(chain: &C, height: u64) -> Result<Block> {
    let native = chain
        .block_at(height, true)
        .await?
        .ok_or(StateUpdateError::MissingBlock(height))?;

    if native.number != height {
        return Err(StateUpdateError::UnexpectedBlock {
            requested: height,
            returned: native.number,
        });
    }

    map_native_block(native)
}

pub fn map_native_block(native: NativeBlock) -> Result<Block> {
    let time = i64::try_from(native.timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .ok_or(StateUpdateError::InvalidTimestamp {
            height: native.number,
            timestamp: native.timestamp,
        })?;

    let transaction_hashes = native
        .transactions
        .iter()
        .map(|entry| {
            transaction_hash(entry).ok_or_else(|| StateUpdateError::UnknownTransactionShape {
                height: native.number,
                entry: entry.to_string(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Block {
        block_height: native.number,
        block_hash: native.hash,
        parent_hash: native.parent_hash,
        time,
        transaction_hashes,
        transactions: Vec::new(),
        holders_update: Vec::new(),
    })
}

/// Accepts a full transaction object carrying `hash`, or a bare hash string.
fn transaction_hash(entry: &Value) -> Option<B256> {
    let hash = match entry {
        Value::Object(fields) => fields.get("hash")?.as_str()?,
        Value::String(hash) => hash.as_str(),
        _ => return None,
    };
    B256::from_str(hash).ok()
}
