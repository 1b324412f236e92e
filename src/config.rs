use crate::error::StateUpdateError;
use crate::models::Checkpoint;
use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use regex::Regex;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MAX_LOOKUP_DISTANCE: u64 = 10;
pub const DEFAULT_BLOCK_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_TRANSACTION_CONCURRENCY: usize = 8;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(12);
pub const DEFAULT_MAX_RETRIES: usize = 5;
pub const DEFAULT_HISTORY_DEPTH: usize = 64;

/// Limits applied to a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Most new blocks fetched by one run.
    pub max_lookup_distance: u64,
    /// Deadline for fetching the whole block range of one run.
    pub block_fetch_timeout: Duration,
    /// Transactions of a block enriched at the same time.
    pub transaction_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_lookup_distance: DEFAULT_MAX_LOOKUP_DISTANCE,
            block_fetch_timeout: DEFAULT_BLOCK_FETCH_TIMEOUT,
            transaction_concurrency: DEFAULT_TRANSACTION_CONCURRENCY,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> std::result::Result<(), StateUpdateError> {
        if self.max_lookup_distance == 0 {
            return Err(StateUpdateError::InvalidConfig(
                "max lookup distance must be positive".into(),
            ));
        }
        if self.block_fetch_timeout.is_zero() {
            return Err(StateUpdateError::InvalidConfig(
                "block fetch timeout must be positive".into(),
            ));
        }
        if self.transaction_concurrency == 0 {
            return Err(StateUpdateError::InvalidConfig(
                "transaction concurrency must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub json_rpc_url: String,
    pub start: Checkpoint,
    pub pipeline: PipelineConfig,
    pub poll_interval: Duration,
    pub max_retries: usize,
    pub history_depth: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let json_rpc_url = lookup("JSON_RPC_URL").context("JSON_RPC_URL must be set in .env")?;

        let token_address = lookup("BLOCK_TOKEN_ADDRESS")
            .map(|s| Address::from_str(&s).context("Invalid BLOCK_TOKEN_ADDRESS format"))
            .transpose()?;

        let block_hash = lookup("BLOCK_FROM_HASH")
            .map(|s| B256::from_str(&s).context("Invalid BLOCK_FROM_HASH format"))
            .transpose()?;

        let block_height = lookup("BLOCK_FROM_BLOCK")
            .map(|s| s.parse::<u64>().context("Invalid BLOCK_FROM_BLOCK"))
            .transpose()?
            .unwrap_or(0);

        let pipeline = PipelineConfig {
            max_lookup_distance: lookup("BLOCK_MAX_LOOKUP_DISTANCE")
                .map(|s| s.parse::<u64>().context("Invalid BLOCK_MAX_LOOKUP_DISTANCE"))
                .transpose()?
                .unwrap_or(DEFAULT_MAX_LOOKUP_DISTANCE),
            block_fetch_timeout: lookup("BLOCK_REQUEST_TIMEOUT")
                .map(|s| parse_duration(&s).context("Invalid BLOCK_REQUEST_TIMEOUT"))
                .transpose()?
                .unwrap_or(DEFAULT_BLOCK_FETCH_TIMEOUT),
            transaction_concurrency: lookup("BLOCK_REQUEST_TX_BATCH")
                .map(|s| s.parse::<usize>().context("Invalid BLOCK_REQUEST_TX_BATCH"))
                .transpose()?
                .unwrap_or(DEFAULT_TRANSACTION_CONCURRENCY),
        };
        pipeline.validate()?;

        let poll_interval = lookup("UPDATER_POLL_INTERVAL")
            .map(|s| parse_duration(&s).context("Invalid UPDATER_POLL_INTERVAL"))
            .transpose()?
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let max_retries = lookup("UPDATER_MAX_RETRIES")
            .map(|s| s.parse::<usize>().context("Invalid UPDATER_MAX_RETRIES"))
            .transpose()?
            .unwrap_or(DEFAULT_MAX_RETRIES);

        let history_depth = lookup("UPDATER_HISTORY_DEPTH")
            .map(|s| s.parse::<usize>().context("Invalid UPDATER_HISTORY_DEPTH"))
            .transpose()?
            .unwrap_or(DEFAULT_HISTORY_DEPTH);

        Ok(Config {
            json_rpc_url,
            start: Checkpoint {
                block_height,
                block_hash,
                token_address,
            },
            pipeline,
            poll_interval,
            max_retries,
            history_depth,
        })
    }
}

/// Parse `1500`, `1500ms`, `30s` or `2m`. A bare number is milliseconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let re = Regex::new(r"^\s*(\d+)\s*(ms|s|m)?\s*$")?;
    let captures = re
        .captures(input)
        .with_context(|| format!("Unrecognized duration: {input}"))?;

    let amount: u64 = captures[1].parse()?;
    let duration = match captures.get(2).map(|m| m.as_str()) {
        None | Some("ms") => Duration::from_millis(amount),
        Some("s") => Duration::from_secs(amount),
        Some("m") => match amount.checked_mul(60) {
            Some(secs) => Duration::from_secs(secs),
            None => anyhow::bail!("Duration out of range: {input}"),
        },
        Some(unit) => anyhow::bail!("Unsupported duration unit: {unit}"),
    };

    Ok(duration)
}
