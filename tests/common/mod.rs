#![allow(dead_code)]

use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, B256, U256};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use token_state_updater::chain::{
    ChainSource, NativeBlock, NativeLog, NativeReceipt, NativeTransaction,
};
use token_state_updater::error::{Result, StateUpdateError};
use token_state_updater::events::{Approval, Transfer};

pub const TOKEN: Address = Address::new([0x11; 20]);
pub const ALICE: Address = Address::new([0xa1; 20]);
pub const BOB: Address = Address::new([0xb0; 20]);
pub const CAROL: Address = Address::new([0xc0; 20]);

pub fn block_hash(height: u64) -> B256 {
    B256::left_padding_from(&height.to_be_bytes())
}

/// Hash of the competing block at `height` after a fork.
pub fn fork_hash(height: u64) -> B256 {
    let mut hash = block_hash(height);
    hash.0[0] = 0xff;
    hash
}

pub fn tx_hash(height: u64, index: u64) -> B256 {
    let mut hash = B256::ZERO;
    hash.0[..8].copy_from_slice(&height.to_be_bytes());
    hash.0[24..].copy_from_slice(&index.to_be_bytes());
    hash.0[12] = 0x7c;
    hash
}

fn log_of(address: Address, event: &impl SolEvent, index: u64) -> NativeLog {
    let data = event.encode_log_data();
    NativeLog {
        address,
        topics: data.topics().to_vec(),
        data: data.data,
        transaction_log_index: Some(index),
    }
}

pub fn transfer_log(token: Address, from: Address, to: Address, value: u64, index: u64) -> NativeLog {
    log_of(
        token,
        &Transfer {
            from,
            to,
            value: U256::from(value),
        },
        index,
    )
}

pub fn approval_log(token: Address, owner: Address, spender: Address, value: u64, index: u64) -> NativeLog {
    log_of(
        token,
        &Approval {
            owner,
            spender,
            value: U256::from(value),
        },
        index,
    )
}

/// A transaction and its receipt, ready to be placed into a [`MockChain`].
pub struct MockTx {
    pub transaction: NativeTransaction,
    pub receipt: NativeReceipt,
}

impl MockTx {
    pub fn new(hash: B256, from: Address, logs: Vec<NativeLog>) -> Self {
        MockTx {
            transaction: NativeTransaction {
                hash,
                from,
                to: Some(TOKEN),
                nonce: 1,
                gas_price: Some(U256::from(1_000_000_000u64)),
                gas: U256::from(100_000u64),
                r: Some(U256::from(1u64)),
                s: Some(U256::from(2u64)),
                v: Some(27),
                y_parity: None,
                transaction_index: Some(0),
            },
            receipt: NativeReceipt {
                transaction_hash: hash,
                transaction_index: Some(0),
                gas_used: U256::from(51_000u64),
                effective_gas_price: Some(U256::from(1_000_000_000u64)),
                logs,
            },
        }
    }
}

/// In-memory chain. Heights, transactions and receipts are all looked up
/// from maps; delays and failures are injected per call kind.
#[derive(Default)]
pub struct MockChain {
    tip: Mutex<u64>,
    blocks: Mutex<HashMap<u64, NativeBlock>>,
    transactions: Mutex<HashMap<B256, NativeTransaction>>,
    receipts: Mutex<HashMap<B256, NativeReceipt>>,
    pub block_delay: Option<Duration>,
    pub transaction_delay: Option<Duration>,
    /// `current_height` fails with a transport error this many times first.
    pub failing_height_calls: AtomicUsize,
    missing_receipts: Mutex<HashSet<B256>>,
    failing_blocks: Mutex<HashSet<u64>>,
    failing_transactions: Mutex<HashSet<B256>>,
    failing_receipts: Mutex<HashSet<B256>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    block_requests: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Linear chain `0..=tip` with empty blocks.
    pub fn with_empty_blocks(tip: u64) -> Self {
        let chain = Self::new();
        for height in 0..=tip {
            chain.add_block(height, Vec::new());
        }
        chain
    }

    pub fn add_block(&self, height: u64, txs: Vec<MockTx>) {
        self.put_block(height, block_hash(height), txs);
    }

    /// Replace the block at `height` with a competing one.
    pub fn fork_block(&self, height: u64, txs: Vec<MockTx>) {
        self.put_block(height, fork_hash(height), txs);
    }

    fn put_block(&self, height: u64, hash: B256, txs: Vec<MockTx>) {
        let hashes = txs
            .iter()
            .map(|tx| Value::String(format!("{:?}", tx.transaction.hash)))
            .collect();
        self.insert_native_block(
            height,
            NativeBlock {
                number: height,
                hash,
                parent_hash: block_hash(height.saturating_sub(1)),
                timestamp: 1_700_000_000 + height * 12,
                transactions: hashes,
            },
        );

        let mut transactions = self.transactions.lock().unwrap();
        let mut receipts = self.receipts.lock().unwrap();
        for tx in txs {
            receipts.insert(tx.receipt.transaction_hash, tx.receipt);
            transactions.insert(tx.transaction.hash, tx.transaction);
        }
    }

    /// Store a block as-is under `height`, for malformed-node scenarios.
    pub fn insert_native_block(&self, height: u64, block: NativeBlock) {
        self.blocks.lock().unwrap().insert(height, block);
        let mut tip = self.tip.lock().unwrap();
        *tip = (*tip).max(height);
    }

    pub fn drop_receipt(&self, hash: B256) {
        self.missing_receipts.lock().unwrap().insert(hash);
    }

    /// `block_at(height)` answers with a transport error from now on.
    pub fn fail_block(&self, height: u64) {
        self.failing_blocks.lock().unwrap().insert(height);
    }

    pub fn fail_transaction(&self, hash: B256) {
        self.failing_transactions.lock().unwrap().insert(hash);
    }

    pub fn fail_receipt(&self, hash: B256) {
        self.failing_receipts.lock().unwrap().insert(hash);
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn block_requests(&self) -> usize {
        self.block_requests.load(Ordering::SeqCst)
    }

    async fn track<T>(&self, delay: Option<Duration>, value: T) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        value
    }
}

impl ChainSource for MockChain {
    async fn current_height(&self) -> Result<u64> {
        let failures = self.failing_height_calls.load(Ordering::SeqCst);
        if failures > 0 {
            self.failing_height_calls.store(failures - 1, Ordering::SeqCst);
            return Err(StateUpdateError::Transport("connection refused".into()));
        }
        Ok(*self.tip.lock().unwrap())
    }

    async fn block_at(&self, height: u64, _include_transactions: bool) -> Result<Option<NativeBlock>> {
        self.block_requests.fetch_add(1, Ordering::SeqCst);
        if self.failing_blocks.lock().unwrap().contains(&height) {
            return Err(StateUpdateError::Transport(format!("block {height} unavailable")));
        }
        let block = self.blocks.lock().unwrap().get(&height).cloned();
        if let Some(delay) = self.block_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(block)
    }

    async fn transaction(&self, hash: B256) -> Result<Option<NativeTransaction>> {
        if self.failing_transactions.lock().unwrap().contains(&hash) {
            return Err(StateUpdateError::Transport(format!("transaction {hash} unavailable")));
        }
        let tx = self.transactions.lock().unwrap().get(&hash).cloned();
        Ok(self.track(self.transaction_delay, tx).await)
    }

    async fn receipt(&self, hash: B256) -> Result<Option<NativeReceipt>> {
        if self.failing_receipts.lock().unwrap().contains(&hash) {
            return Err(StateUpdateError::Transport(format!("receipt {hash} unavailable")));
        }
        let receipt = if self.missing_receipts.lock().unwrap().contains(&hash) {
            None
        } else {
            self.receipts.lock().unwrap().get(&hash).cloned()
        };
        Ok(self.track(self.transaction_delay, receipt).await)
    }
}
