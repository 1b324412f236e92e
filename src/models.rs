use crate::error::{Result, StateUpdateError};
use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Caller-supplied cursor: the last block the caller has already processed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checkpoint {
    pub block_height: u64,
    pub block_hash: Option<B256>,
    pub token_address: Option<Address>,
}

impl Checkpoint {
    pub fn new(block_height: u64) -> Self {
        Self {
            block_height,
            ..Default::default()
        }
    }

    pub fn with_hash(mut self, block_hash: B256) -> Self {
        self.block_hash = Some(block_hash);
        self
    }

    pub fn with_token(mut self, token_address: Address) -> Self {
        self.token_address = Some(token_address);
        self
    }
}

/// Wire shape of an incoming state-update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub block_height: Option<i64>,
    pub token_address: Option<String>,
    pub block_hash: Option<String>,
}

impl TryFrom<UpdateRequest> for Checkpoint {
    type Error = StateUpdateError;

    fn try_from(request: UpdateRequest) -> Result<Self> {
        let block_height = match request.block_height {
            None => 0,
            Some(height) => u64::try_from(height).map_err(|_| {
                StateUpdateError::InvalidInput(format!("block height {height} is negative"))
            })?,
        };

        let block_hash = request
            .block_hash
            .as_deref()
            .map(|hash| {
                B256::from_str(hash).map_err(|_| {
                    StateUpdateError::InvalidInput(format!("invalid block hash: {hash}"))
                })
            })
            .transpose()?;

        let token_address = request
            .token_address
            .as_deref()
            .map(|addr| {
                Address::from_str(addr).map_err(|_| {
                    StateUpdateError::InvalidInput(format!("invalid token address: {addr}"))
                })
            })
            .transpose()?;

        Ok(Checkpoint {
            block_height,
            block_hash,
            token_address,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub block_height: u64,
    pub block_hash: B256,
    pub parent_hash: B256,
    pub time: DateTime<Utc>,
    pub transaction_hashes: Vec<B256>,
    pub transactions: Vec<Transaction>,
    pub holders_update: Vec<HolderUpdate>,
}

impl Block {
    /// Transfer events of every transaction, in transaction order then log order.
    pub fn transfers(&self) -> impl Iterator<Item = &TransferEvent> {
        self.transactions
            .iter()
            .flat_map(|tx| tx.events.iter())
            .filter_map(|event| match event {
                Event::Transfer(transfer) => Some(transfer),
                Event::Approve(_) => None,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub r: U256,
    pub s: U256,
    pub v: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: B256,
    pub sender: Address,
    pub receiver: Option<Address>,
    pub nonce: u64,
    #[serde(with = "decimal")]
    pub gas_price: U256,
    #[serde(with = "decimal")]
    pub gas_limit: U256,
    #[serde(with = "decimal")]
    pub gas_consumed: U256,
    pub signature: Option<Signature>,
    pub index: Option<u64>,
    pub events: Vec<Event>,
}

/// Token events we track. Anything else is filtered out before one of these
/// is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "eventType")]
pub enum Event {
    Transfer(TransferEvent),
    Approve(ApproveEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferEvent {
    pub from: Address,
    pub to: Address,
    #[serde(with = "decimal")]
    pub value: U256,
    pub event_index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveEvent {
    pub owner: Address,
    pub spender: Address,
    #[serde(with = "decimal")]
    pub value: U256,
}

/// Per-address token movement within one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolderUpdate {
    pub address: Address,
    #[serde(with = "decimal")]
    pub incoming: U256,
    #[serde(with = "decimal")]
    pub outgoing: U256,
}

impl HolderUpdate {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            incoming: U256::ZERO,
            outgoing: U256::ZERO,
        }
    }
}

/// Result of one pipeline run. `reversed_blocks` and `incoming_blocks` are
/// never both non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    pub reversed_blocks: Vec<B256>,
    pub incoming_blocks: Vec<Block>,
}

impl StateUpdate {
    pub fn reorganized(block_hash: B256) -> Self {
        Self {
            reversed_blocks: vec![block_hash],
            incoming_blocks: Vec::new(),
        }
    }

    pub fn incoming(blocks: Vec<Block>) -> Self {
        Self {
            reversed_blocks: Vec::new(),
            incoming_blocks: blocks,
        }
    }

    pub fn is_reorg(&self) -> bool {
        !self.reversed_blocks.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.reversed_blocks.is_empty() && self.incoming_blocks.is_empty()
    }
}

/// U256 as a base-10 string, e.g. `"9007199254740994"`.
pub mod decimal {
    use alloy_primitives::U256;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        U256::from_str_radix(&s, 10).map_err(serde::de::Error::custom)
    }
}
