use crate::chain::{ChainSource, NativeReceipt, NativeTransaction};
use crate::error::{Result, StateUpdateError};
use crate::models::{Signature, Transaction};
use crate::parser::parse_events;
use alloy_primitives::{Address, B256};
use tracing::debug;

/// Resolve one transaction hash into a full record with its decoded events.
///
/// Any failure fetching the transaction or its receipt fails the whole call.
pub async fn enrich_transaction<C: ChainSource>(
    chain: &C,
    hash: B256,
    token_address: Option<Address>,
) -> Result<Transaction> {
    let native = chain
        .transaction(hash)
        .await?
        .ok_or(StateUpdateError::MissingTransaction(hash))?;
    let receipt = chain
        .receipt(hash)
        .await?
        .ok_or(StateUpdateError::MissingReceipt(hash))?;

    let transaction = merge_transaction(hash, native, receipt, token_address)?;
    debug!(
        "Enriched transaction {:?} with {} events",
        hash,
        transaction.events.len()
    );
    Ok(transaction)
}

fn merge_transaction(
    hash: B256,
    native: NativeTransaction,
    receipt: NativeReceipt,
    token_address: Option<Address>,
) -> Result<Transaction> {
    for found in [native.hash, receipt.transaction_hash] {
        if found != hash {
            return Err(StateUpdateError::MismatchedReceipt {
                expected: hash,
                found,
            });
        }
    }

    let gas_price = native
        .gas_price
        .or(receipt.effective_gas_price)
        .ok_or(StateUpdateError::IncompleteTransaction {
            hash: native.hash,
            field: "gasPrice",
        })?;

    let signature = match (native.r, native.s, native.v.or(native.y_parity)) {
        (Some(r), Some(s), Some(v)) => Some(Signature { r, s, v }),
        _ => None,
    };

    Ok(Transaction {
        hash,
        sender: native.from,
        receiver: native.to,
        nonce: native.nonce,
        gas_price,
        gas_limit: native.gas,
        gas_consumed: receipt.gas_used,
        signature,
        index: receipt.transaction_index.or(native.transaction_index),
        events: parse_events(&receipt.logs, token_address),
    })
}
