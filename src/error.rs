//! Error types for the state-update pipeline.

use alloy_primitives::{Address, B256};
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StateUpdateError>;

/// Failures that abort a whole pipeline run.
///
/// Logs that fail to decode, or decode to an event we do not track, are not
/// errors and never show up here.
#[derive(Debug, Error)]
pub enum StateUpdateError {
    #[error("invalid checkpoint: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("chain transport error: {0}")]
    Transport(String),

    #[error("blocks {from}..={to} were not fetched within {timeout:?}")]
    Timeout {
        from: u64,
        to: u64,
        timeout: Duration,
    },

    #[error("unknown transaction shape in block {height}: {entry}")]
    UnknownTransactionShape { height: u64, entry: String },

    #[error("block {0} is not available on the chain")]
    MissingBlock(u64),

    #[error("requested block {requested}, node returned block {returned}")]
    UnexpectedBlock { requested: u64, returned: u64 },

    #[error("block {height} has an out-of-range timestamp {timestamp}")]
    InvalidTimestamp { height: u64, timestamp: u64 },

    #[error("transaction {0} not found")]
    MissingTransaction(B256),

    #[error("receipt for transaction {0} not found")]
    MissingReceipt(B256),

    #[error("receipt for transaction {found} returned when fetching {expected}")]
    MismatchedReceipt { expected: B256, found: B256 },

    #[error("transaction {hash} is missing field '{field}'")]
    IncompleteTransaction { hash: B256, field: &'static str },

    #[error("holder balance overflow for {address}")]
    BalanceOverflow { address: Address },
}

impl StateUpdateError {
    /// Returns `true` if re-running the same checkpoint may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout { .. })
    }

    /// Returns `true` for fatal decoding failures of chain data.
    pub fn is_decoding(&self) -> bool {
        matches!(
            self,
            Self::UnknownTransactionShape { .. }
                | Self::UnexpectedBlock { .. }
                | Self::InvalidTimestamp { .. }
                | Self::MissingTransaction(_)
                | Self::MissingReceipt(_)
                | Self::MismatchedReceipt { .. }
                | Self::IncompleteTransaction { .. }
        )
    }
}
