//! Checkpoint tracker: where the next pipeline run starts from.
//!
//! Keeps a sliding window of recently reported blocks so that a rejected
//! checkpoint can be replaced by the block before it. Repeated rejections walk
//! back through a fork one block per run.

use crate::models::{Checkpoint, StateUpdate};
use alloy_primitives::B256;
use std::collections::VecDeque;
use tracing::warn;

pub struct CheckpointTracker {
    current: Checkpoint,
    /// Recently reported `(height, hash)` pairs, oldest first.
    window: VecDeque<(u64, B256)>,
    window_size: usize,
}

impl CheckpointTracker {
    pub fn new(start: Checkpoint, window_size: usize) -> Self {
        let mut window = VecDeque::with_capacity(window_size);
        if let Some(hash) = start.block_hash {
            window.push_back((start.block_height, hash));
        }
        Self {
            current: start,
            window,
            window_size,
        }
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.current
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Move the checkpoint according to the outcome of one run.
    pub fn apply(&mut self, update: &StateUpdate) {
        if update.is_reorg() {
            self.rewind();
            return;
        }

        for block in &update.incoming_blocks {
            if self.window_size > 0 && self.window.len() >= self.window_size {
                self.window.pop_front();
            }
            if self.window_size > 0 {
                self.window.push_back((block.block_height, block.block_hash));
            }
            self.current.block_height = block.block_height;
            self.current.block_hash = Some(block.block_hash);
        }
    }

    fn rewind(&mut self) {
        let rejected = self.current.block_height;
        while let Some(&(height, _)) = self.window.back() {
            if height >= rejected {
                self.window.pop_back();
            } else {
                break;
            }
        }

        match self.window.back() {
            Some(&(height, hash)) => {
                self.current.block_height = height;
                self.current.block_hash = Some(hash);
            }
            None => {
                self.current.block_height = rejected.saturating_sub(1);
                self.current.block_hash = None;
            }
        }

        warn!(
            "Rewound checkpoint from block {} to block {}",
            rejected, self.current.block_height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Block;
    use chrono::DateTime;

    fn block(height: u64) -> Block {
        Block {
            block_height: height,
            block_hash: B256::with_last_byte(height as u8),
            parent_hash: B256::with_last_byte(height.saturating_sub(1) as u8),
            time: DateTime::from_timestamp(height as i64 * 12, 0).unwrap(),
            transaction_hashes: Vec::new(),
            transactions: Vec::new(),
            holders_update: Vec::new(),
        }
    }

    fn forward(heights: std::ops::RangeInclusive<u64>) -> StateUpdate {
        StateUpdate::incoming(heights.map(block).collect())
    }

    #[test]
    fn forward_progress_advances_to_last_block() {
        let mut tracker = CheckpointTracker::new(Checkpoint::new(100), 16);
        tracker.apply(&forward(101..=103));
        assert_eq!(tracker.checkpoint().block_height, 103);
        assert_eq!(tracker.checkpoint().block_hash, Some(B256::with_last_byte(103)));
        assert_eq!(tracker.len(), 3);
    }

    #[test]
    fn empty_update_keeps_checkpoint() {
        let start = Checkpoint::new(100).with_hash(B256::with_last_byte(100));
        let mut tracker = CheckpointTracker::new(start.clone(), 16);
        tracker.apply(&StateUpdate::default());
        assert_eq!(tracker.checkpoint(), &start);
    }

    #[test]
    fn reorg_rewinds_to_previous_known_block() {
        let mut tracker = CheckpointTracker::new(Checkpoint::new(100), 16);
        tracker.apply(&forward(101..=103));
        tracker.apply(&StateUpdate::reorganized(B256::with_last_byte(103)));

        assert_eq!(tracker.checkpoint().block_height, 102);
        assert_eq!(tracker.checkpoint().block_hash, Some(B256::with_last_byte(102)));

        tracker.apply(&StateUpdate::reorganized(B256::with_last_byte(102)));
        assert_eq!(tracker.checkpoint().block_height, 101);
    }

    #[test]
    fn reorg_past_window_steps_back_without_hash() {
        let start = Checkpoint::new(100).with_hash(B256::with_last_byte(100));
        let mut tracker = CheckpointTracker::new(start, 16);
        tracker.apply(&StateUpdate::reorganized(B256::with_last_byte(100)));

        assert_eq!(tracker.checkpoint().block_height, 99);
        assert_eq!(tracker.checkpoint().block_hash, None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn window_size_enforced() {
        let mut tracker = CheckpointTracker::new(Checkpoint::new(0), 5);
        tracker.apply(&forward(1..=10));
        assert_eq!(tracker.len(), 5);
        assert_eq!(tracker.checkpoint().block_height, 10);
    }

    #[test]
    fn token_filter_survives_moves() {
        let token = alloy_primitives::Address::repeat_byte(0x11);
        let mut tracker = CheckpointTracker::new(Checkpoint::new(0).with_token(token), 4);
        tracker.apply(&forward(1..=2));
        tracker.apply(&StateUpdate::reorganized(B256::with_last_byte(2)));
        assert_eq!(tracker.checkpoint().token_address, Some(token));
    }
}
