use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use token_state_updater::config::{Config, PipelineConfig, parse_duration};
use token_state_updater::models::UpdateRequest;
use token_state_updater::pipeline::StateUpdatePipeline;
use token_state_updater::query::commands::{cmd_state_update, resolve_checkpoint};
use token_state_updater::query::formatters::OutputFormat;
use token_state_updater::rpc::RpcClient;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Build one token state update from a checkpoint", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    /// Token decimals used when rendering amounts in table output
    #[arg(long, default_value = "18")]
    decimals: u8,

    /// JSON-RPC endpoint; falls back to JSON_RPC_URL
    #[arg(long)]
    rpc_url: Option<String>,

    #[arg(long)]
    block_height: Option<i64>,

    #[arg(long)]
    block_hash: Option<String>,

    #[arg(long)]
    token_address: Option<String>,

    /// Full request as JSON, e.g. '{"blockHeight": 100, "blockHash": "0x..."}'
    #[arg(long, conflicts_with_all = ["block_height", "block_hash", "token_address"])]
    request: Option<String>,

    #[arg(long)]
    max_lookup_distance: Option<u64>,

    /// Deadline for the block range fetch, e.g. "30s" or "500ms"
    #[arg(long)]
    timeout: Option<String>,

    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let checkpoint = resolve_checkpoint(
        cli.request.as_deref(),
        UpdateRequest {
            block_height: cli.block_height,
            block_hash: cli.block_hash,
            token_address: cli.token_address,
        },
    )?;

    let (rpc_url, mut pipeline_config) = match cli.rpc_url {
        Some(url) => (url, PipelineConfig::default()),
        None => {
            let config = Config::from_env()?;
            (config.json_rpc_url, config.pipeline)
        }
    };
    if let Some(distance) = cli.max_lookup_distance {
        pipeline_config.max_lookup_distance = distance;
    }
    if let Some(timeout) = cli.timeout {
        pipeline_config.block_fetch_timeout =
            parse_duration(&timeout).context("Invalid --timeout")?;
    }
    if let Some(concurrency) = cli.concurrency {
        pipeline_config.transaction_concurrency = concurrency;
    }

    let client = RpcClient::new(&rpc_url)?;
    let pipeline = StateUpdatePipeline::new(client, pipeline_config)?;
    let limits = pipeline.config();
    info!(
        "Lookup distance {} blocks, fetch timeout {:?}, {} concurrent transactions",
        limits.max_lookup_distance, limits.block_fetch_timeout, limits.transaction_concurrency
    );

    cmd_state_update(&pipeline, &checkpoint, cli.decimals, &format).await?;

    Ok(())
}
