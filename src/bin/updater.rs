use anyhow::Result;
use std::io;
use token_state_updater::config::Config;
use token_state_updater::output_worker::run_output_worker;
use token_state_updater::pipeline::StateUpdatePipeline;
use token_state_updater::query::formatters::OutputFormat;
use token_state_updater::rpc::RpcClient;
use token_state_updater::scheduler::Scheduler;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const OUTPUT_CHANNEL_CAPACITY: usize = 16;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    info!("Starting token state updater");

    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("RPC URL: {}", config.json_rpc_url);
    if let Some(token) = config.start.token_address {
        info!("Token address: {:?}", token);
    }

    let client = RpcClient::new(&config.json_rpc_url)?;
    let pipeline = StateUpdatePipeline::new(client, config.pipeline.clone())?;

    let (tx, rx) = mpsc::channel(OUTPUT_CHANNEL_CAPACITY);
    let output = tokio::spawn(run_output_worker(rx, OutputFormat::Json, 18, io::stdout()));

    let mut scheduler = Scheduler::new(
        pipeline,
        config.start.clone(),
        config.history_depth,
        config.poll_interval,
        config.max_retries,
        tx,
    );

    let result = tokio::select! {
        result = scheduler.run() => result,
        _ = tokio::signal::ctrl_c() => Ok(()),
    };
    info!("Shutting down at block {}", scheduler.checkpoint().block_height);
    drop(scheduler);

    match output.await {
        Ok(Err(e)) => error!("Output worker error: {}", e),
        Err(e) => error!("Output worker panicked: {}", e),
        Ok(Ok(())) => {}
    }

    if let Err(e) = &result {
        error!("Updater error: {}", e);
    }
    result
}
