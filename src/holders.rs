use crate::error::{Result, StateUpdateError};
use crate::models::{HolderUpdate, TransferEvent};
use alloy_primitives::Address;
use std::collections::HashMap;

/// Fold one block's transfers into per-address incoming/outgoing totals.
///
/// Output is in first-seen address order (sender before receiver).
pub fn aggregate_holders<'a, I>(transfers: I) -> Result<Vec<HolderUpdate>>
where
    I: IntoIterator<Item = &'a TransferEvent>,
{
    let mut holders: Vec<HolderUpdate> = Vec::new();
    let mut positions: HashMap<Address, usize> = HashMap::new();

    for transfer in transfers {
        let from = holder_slot(&mut holders, &mut positions, transfer.from);
        holders[from].outgoing = holders[from]
            .outgoing
            .checked_add(transfer.value)
            .ok_or(StateUpdateError::BalanceOverflow {
                address: transfer.from,
            })?;

        let to = holder_slot(&mut holders, &mut positions, transfer.to);
        holders[to].incoming = holders[to]
            .incoming
            .checked_add(transfer.value)
            .ok_or(StateUpdateError::BalanceOverflow {
                address: transfer.to,
            })?;
    }

    Ok(holders)
}

fn holder_slot(
    holders: &mut Vec<HolderUpdate>,
    positions: &mut HashMap<Address, usize>,
    address: Address,
) -> usize {
    *positions.entry(address).or_insert_with(|| {
        holders.push(HolderUpdate::new(address));
        holders.len() - 1
    })
}
