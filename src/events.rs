use crate::chain::NativeLog;
use alloy::sol;
use alloy::sol_types::SolEvent;

sol! {
    event Transfer(address indexed from, address indexed to, uint256 value);
    event Approval(address indexed owner, address indexed spender, uint256 value);
    event OwnershipTransferred(address indexed previousOwner, address indexed newOwner);
}

/// A log decoded against the tracked token's ABI.
pub enum DecodedLog {
    Transfer(Transfer),
    Approval(Approval),
    OwnershipTransferred(OwnershipTransferred),
}

impl DecodedLog {
    pub fn name(&self) -> &'static str {
        match self {
            DecodedLog::Transfer(_) => "Transfer",
            DecodedLog::Approval(_) => "Approval",
            DecodedLog::OwnershipTransferred(_) => "OwnershipTransferred",
        }
    }
}

pub fn decode_token_log(log: &NativeLog) -> anyhow::Result<DecodedLog> {
    let topics = log.topics.as_slice();
    let Some(topic0) = topics.first() else {
        anyhow::bail!("anonymous log from {:?}", log.address);
    };

    let decoded = if *topic0 == Transfer::SIGNATURE_HASH {
        DecodedLog::Transfer(Transfer::decode_raw_log(topics, &log.data)?)
    } else if *topic0 == Approval::SIGNATURE_HASH {
        DecodedLog::Approval(Approval::decode_raw_log(topics, &log.data)?)
    } else if *topic0 == OwnershipTransferred::SIGNATURE_HASH {
        DecodedLog::OwnershipTransferred(OwnershipTransferred::decode_raw_log(
            topics, &log.data,
        )?)
    } else {
        anyhow::bail!("unknown event signature {topic0:?}");
    };

    Ok(decoded)
}
