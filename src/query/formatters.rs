use crate::models::{Block, StateUpdate};
use alloy_primitives::U256;
use alloy_primitives::utils::format_units;
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

pub fn format_state_update(update: &StateUpdate, decimals: u8, format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => format_state_update_table(update, decimals),
        OutputFormat::Json => {
            serde_json::to_string_pretty(update).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Csv => format_state_update_csv(update),
    }
}

fn format_state_update_table(update: &StateUpdate, decimals: u8) -> String {
    if update.is_reorg() {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_header(vec!["Reversed Block Hash"]);
        for hash in &update.reversed_blocks {
            table.add_row(vec![Cell::new(format!("{hash:?}"))]);
        }
        return format!("Chain reorganization detected\n{table}");
    }

    if update.incoming_blocks.is_empty() {
        return "No new blocks.".to_string();
    }

    let mut blocks = Table::new();
    blocks
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Block", "Hash", "Time", "Transactions", "Holders"]);

    for block in &update.incoming_blocks {
        blocks.add_row(vec![
            Cell::new(block.block_height),
            Cell::new(format_hash(&format!("{:?}", block.block_hash))),
            Cell::new(block.time.to_rfc3339()),
            Cell::new(block.transactions.len()),
            Cell::new(block.holders_update.len()),
        ]);
    }

    let mut output = blocks.to_string();
    if let Some(holders) = format_holders_table(&update.incoming_blocks, decimals) {
        output.push('\n');
        output.push_str(&holders);
    }
    output
}

fn format_holders_table(blocks: &[Block], decimals: u8) -> Option<String> {
    if blocks.iter().all(|block| block.holders_update.is_empty()) {
        return None;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec![
            "Block",
            "Address",
            "Incoming",
            "Outgoing",
            "Incoming (Raw)",
            "Outgoing (Raw)",
        ]);

    for block in blocks {
        for holder in &block.holders_update {
            table.add_row(vec![
                Cell::new(block.block_height),
                Cell::new(holder.address.to_string()),
                Cell::new(format_amount(holder.incoming, decimals)),
                Cell::new(format_amount(holder.outgoing, decimals)),
                Cell::new(holder.incoming.to_string()),
                Cell::new(holder.outgoing.to_string()),
            ]);
        }
    }

    Some(table.to_string())
}

fn format_state_update_csv(update: &StateUpdate) -> String {
    let mut wtr = Writer::from_writer(vec![]);

    if update.is_reorg() {
        let _ = wtr.write_record(["reversed_block_hash"]);
        for hash in &update.reversed_blocks {
            let _ = wtr.write_record([format!("{hash:?}")]);
        }
    } else {
        let _ = wtr.write_record([
            "block_height",
            "block_hash",
            "address",
            "incoming",
            "outgoing",
        ]);
        for block in &update.incoming_blocks {
            for holder in &block.holders_update {
                let _ = wtr.write_record([
                    &block.block_height.to_string(),
                    &format!("{:?}", block.block_hash),
                    &holder.address.to_string(),
                    &holder.incoming.to_string(),
                    &holder.outgoing.to_string(),
                ]);
            }
        }
    }

    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

fn format_amount(value: U256, decimals: u8) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}

fn format_hash(hash: &str) -> String {
    if hash.len() <= 12 {
        return hash.to_string();
    }
    format!("{}...{}", &hash[..6], &hash[hash.len() - 4..])
}
