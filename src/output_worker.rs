use crate::models::StateUpdate;
use crate::query::formatters::{OutputFormat, format_state_update};
use anyhow::Result;
use std::io::Write;
use tokio::sync::mpsc;
use tracing::info;

/// Drain state updates and write each one to `out` in the given format.
pub async fn run_output_worker<W: Write>(
    mut rx: mpsc::Receiver<StateUpdate>,
    format: OutputFormat,
    decimals: u8,
    mut out: W,
) -> Result<()> {
    while let Some(update) = rx.recv().await {
        let rendered = format_state_update(&update, decimals, &format);
        writeln!(out, "{rendered}")?;
        out.flush()?;

        if update.is_reorg() {
            info!("Published reorg of {} block(s)", update.reversed_blocks.len());
        } else {
            info!("Published {} incoming block(s)", update.incoming_blocks.len());
        }
    }
    Ok(())
}
