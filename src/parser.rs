use crate::chain::NativeLog;
use crate::events::{DecodedLog, decode_token_log};
use crate::models::{ApproveEvent, Event, TransferEvent};
use alloy_primitives::Address;
use tracing::{debug, trace};

/// Decode the tracked token's `Transfer` and `Approval` logs.
///
/// Without a token address there is nothing to decode against, so the result
/// is empty. Logs from other contracts, logs that fail to decode and decoded
/// events of any other kind are skipped.
pub fn parse_events(logs: &[NativeLog], token_address: Option<Address>) -> Vec<Event> {
    let Some(token_address) = token_address else {
        return Vec::new();
    };

    logs.iter()
        .enumerate()
        .filter(|(_, log)| log.address == token_address)
        .filter_map(|(position, log)| {
            let decoded = match decode_token_log(log) {
                Ok(decoded) => decoded,
                Err(e) => {
                    debug!("Skipping undecodable log from {:?}: {}", log.address, e);
                    return None;
                }
            };
            let event_index = log.transaction_log_index.unwrap_or(position as u64);

            match decoded {
                DecodedLog::Transfer(transfer) => Some(Event::Transfer(TransferEvent {
                    from: transfer.from,
                    to: transfer.to,
                    value: transfer.value,
                    event_index,
                })),
                DecodedLog::Approval(approval) => Some(Event::Approve(ApproveEvent {
                    owner: approval.owner,
                    spender: approval.spender,
                    value: approval.value,
                })),
                other => {
                    trace!("Ignoring {} event", other.name());
                    None
                }
            }
        })
        .collect()
}
