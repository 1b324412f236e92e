//! Checkpoint validation against the canonical chain.
//!
//! Only the checkpoint's own height is inspected. A fork deeper than one block
//! is walked back by the caller, one rejected checkpoint per run.

use crate::chain::ChainSource;
use crate::error::Result;
use crate::models::Checkpoint;
use alloy_primitives::B256;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorgVerdict {
    /// The checkpoint carries no hash, so there is nothing to validate.
    Unchecked,
    /// The chain still has the checkpoint's block at its height.
    Canonical,
    /// The checkpoint's block is gone; it must be reported as reversed.
    Reorganized { reversed: B256 },
}

pub async fn check_checkpoint<C: ChainSource>(
    chain: &C,
    checkpoint: &Checkpoint,
) -> Result<ReorgVerdict> {
    let Some(known_hash) = checkpoint.block_hash else {
        return Ok(ReorgVerdict::Unchecked);
    };

    let current = chain.block_at(checkpoint.block_height, false).await?;
    match current {
        Some(block) if block.hash == known_hash => {
            debug!("Checkpoint {} is canonical", checkpoint.block_height);
            Ok(ReorgVerdict::Canonical)
        }
        Some(block) => {
            warn!(
                at = checkpoint.block_height,
                expected = ?known_hash,
                actual = ?block.hash,
                "Reorg detected"
            );
            Ok(ReorgVerdict::Reorganized {
                reversed: known_hash,
            })
        }
        None => {
            warn!(
                at = checkpoint.block_height,
                expected = ?known_hash,
                "Checkpoint block no longer exists"
            );
            Ok(ReorgVerdict::Reorganized {
                reversed: known_hash,
            })
        }
    }
}
