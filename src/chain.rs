//! Chain data source seam and the native JSON-RPC shapes it returns.

use crate::error::Result;
use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Deserializer};
use std::future::Future;

/// Read access to a chain node. Implementations must tolerate concurrent calls.
pub trait ChainSource: Send + Sync {
    fn current_height(&self) -> impl Future<Output = Result<u64>> + Send;

    fn block_at(
        &self,
        height: u64,
        include_transactions: bool,
    ) -> impl Future<Output = Result<Option<NativeBlock>>> + Send;

    fn transaction(&self, hash: B256) -> impl Future<Output = Result<Option<NativeTransaction>>> + Send;

    fn receipt(&self, hash: B256) -> impl Future<Output = Result<Option<NativeReceipt>>> + Send;
}

/// Block as returned by `eth_getBlockByNumber`.
///
/// `transactions` is kept raw: entries are either full transaction objects or
/// bare hashes depending on how the block was requested.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeBlock {
    #[serde(deserialize_with = "deserialize_hex_u64")]
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    #[serde(deserialize_with = "deserialize_hex_u64")]
    pub timestamp: u64,
    #[serde(default)]
    pub transactions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransaction {
    pub hash: B256,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(deserialize_with = "deserialize_hex_u64")]
    pub nonce: u64,
    #[serde(default)]
    pub gas_price: Option<U256>,
    pub gas: U256,
    #[serde(default)]
    pub r: Option<U256>,
    #[serde(default)]
    pub s: Option<U256>,
    #[serde(default, deserialize_with = "deserialize_hex_u64_opt")]
    pub v: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_hex_u64_opt")]
    pub y_parity: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_hex_u64_opt")]
    pub transaction_index: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeReceipt {
    pub transaction_hash: B256,
    #[serde(default, deserialize_with = "deserialize_hex_u64_opt")]
    pub transaction_index: Option<u64>,
    pub gas_used: U256,
    #[serde(default)]
    pub effective_gas_price: Option<U256>,
    #[serde(default)]
    pub logs: Vec<NativeLog>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeLog {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    /// Position within the emitting transaction, when the node reports it.
    #[serde(default, deserialize_with = "deserialize_hex_u64_opt")]
    pub transaction_log_index: Option<u64>,
}

fn parse_hex_u64(s: &str) -> std::result::Result<u64, std::num::ParseIntError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(digits, 16)
}

fn deserialize_hex_u64<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_hex_u64(&s).map_err(serde::de::Error::custom)
}

fn deserialize_hex_u64_opt<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    s.map(|s| parse_hex_u64(&s).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_block_with_hash_list() {
        let block: NativeBlock = serde_json::from_value(json!({
            "number": "0x65",
            "hash": format!("0x{}", "ab".repeat(32)),
            "parentHash": format!("0x{}", "cd".repeat(32)),
            "timestamp": "0x5f5e100",
            "transactions": [format!("0x{}", "01".repeat(32))],
            "miner": "0x0000000000000000000000000000000000000000"
        }))
        .unwrap();

        assert_eq!(block.number, 101);
        assert_eq!(block.timestamp, 100_000_000);
        assert_eq!(block.hash, B256::repeat_byte(0xab));
        assert_eq!(block.transactions.len(), 1);
    }

    #[test]
    fn deserializes_receipt_logs() {
        let receipt: NativeReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "01".repeat(32)),
            "transactionIndex": "0x2",
            "gasUsed": "0x5208",
            "logs": [{
                "address": "0x1111111111111111111111111111111111111111",
                "topics": [],
                "data": "0x",
                "logIndex": "0x7"
            }]
        }))
        .unwrap();

        assert_eq!(receipt.transaction_index, Some(2));
        assert_eq!(receipt.gas_used, U256::from(21_000u64));
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].transaction_log_index, None);
    }

    #[test]
    fn odd_length_quantities_parse() {
        assert_eq!(parse_hex_u64("0x1").unwrap(), 1);
        assert_eq!(parse_hex_u64("0xfff").unwrap(), 4095);
        assert!(parse_hex_u64("0xzz").is_err());
    }
}
