//! Conversions between the ICS-20 ABI structs and ledger IBC types.

use crate::abi::IICS20;
use alloy_primitives::Bytes;
use bridge_ledger::{
    ibc::{Denom, Height, Hop, MsgTransfer, PageRequest, PageResponse},
    to_bech32, Coin, LedgerError,
};

/// Builds the transfer message for a `transfer` call; the sender is the bech32
/// form of the call's `sender` argument.
pub fn msg_transfer_from_call(
    call: &IICS20::transferCall,
    bech32_prefix: &str,
) -> Result<MsgTransfer, LedgerError> {
    Ok(MsgTransfer {
        source_port: call.sourcePort.clone(),
        source_channel: call.sourceChannel.clone(),
        token: Coin::new(call.denom.clone(), call.amount),
        sender: to_bech32(bech32_prefix, call.sender)?,
        receiver: call.receiver.clone(),
        timeout_height: Height::new(
            call.timeoutHeight.revisionNumber,
            call.timeoutHeight.revisionHeight,
        ),
        timeout_timestamp: call.timeoutTimestamp,
        memo: call.memo.clone(),
    })
}

pub fn denom_to_abi(denom: Denom) -> IICS20::Denom {
    IICS20::Denom {
        base: denom.base,
        trace: denom
            .trace
            .into_iter()
            .map(|hop| IICS20::Hop { portId: hop.port_id, channelId: hop.channel_id })
            .collect(),
    }
}

pub(super) fn page_request_from_abi(page: IICS20::PageRequest) -> PageRequest {
    PageRequest {
        key: page.key.to_vec(),
        offset: page.offset,
        limit: page.limit,
        count_total: page.countTotal,
        reverse: page.reverse,
    }
}

pub(super) fn page_response_to_abi(page: PageResponse) -> IICS20::PageResponse {
    IICS20::PageResponse { nextKey: Bytes::from(page.next_key), total: page.total }
}
