use crate::chain::{ChainSource, NativeBlock, NativeReceipt, NativeTransaction};
use crate::error::{Result, StateUpdateError};
use alloy::providers::fillers::FillProvider;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::BlockNumberOrTag;
use alloy_primitives::B256;
use tracing::debug;

type AlloyFullProvider = FillProvider<
    alloy::providers::fillers::JoinFill<
        alloy::providers::Identity,
        alloy::providers::fillers::JoinFill<
            alloy::providers::fillers::GasFiller,
            alloy::providers::fillers::JoinFill<
                alloy::providers::fillers::BlobGasFiller,
                alloy::providers::fillers::JoinFill<
                    alloy::providers::fillers::NonceFiller,
                    alloy::providers::fillers::ChainIdFiller,
                >,
            >,
        >,
    >,
    alloy::providers::RootProvider,
>;

/// [`ChainSource`] backed by a JSON-RPC node over HTTP.
#[derive(Clone)]
pub struct RpcClient {
    provider: AlloyFullProvider,
    url: String,
}

impl RpcClient {
    pub fn new(rpc_url: &str) -> anyhow::Result<Self> {
        let parsed_url = rpc_url
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid RPC URL: {}", rpc_url))?;
        let provider: AlloyFullProvider = ProviderBuilder::new().connect_http(parsed_url);

        Ok(RpcClient {
            provider,
            url: rpc_url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn transport_error(&self, method: &str, e: impl std::fmt::Display) -> StateUpdateError {
        StateUpdateError::Transport(format!("{method} on {}: {e}", self.url))
    }
}

impl ChainSource for RpcClient {
    async fn current_height(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| self.transport_error("eth_blockNumber", e))
    }

    async fn block_at(&self, height: u64, include_transactions: bool) -> Result<Option<NativeBlock>> {
        debug!("eth_getBlockByNumber({}, {})", height, include_transactions);
        self.provider
            .raw_request(
                "eth_getBlockByNumber".into(),
                (BlockNumberOrTag::Number(height), include_transactions),
            )
            .await
            .map_err(|e| self.transport_error("eth_getBlockByNumber", e))
    }

    async fn transaction(&self, hash: B256) -> Result<Option<NativeTransaction>> {
        self.provider
            .raw_request("eth_getTransactionByHash".into(), (hash,))
            .await
            .map_err(|e| self.transport_error("eth_getTransactionByHash", e))
    }

    async fn receipt(&self, hash: B256) -> Result<Option<NativeReceipt>> {
        self.provider
            .raw_request("eth_getTransactionReceipt".into(), (hash,))
            .await
            .map_err(|e| self.transport_error("eth_getTransactionReceipt", e))
    }
}
