use super::{types::msg_transfer_from_call, Ics20Precompile};
use crate::{
    abi::IICS20,
    error::{ics20_error, BridgeError, PrecompileCallError},
    runner::CallScope,
};
use alloy::sol_types::{SolEvent, SolValue};
use alloy_primitives::{keccak256, Bytes, Log};
use bridge_ledger::{
    ibc::{escrow_address, is_channel_id_format, validate_client_identifier, State},
    Context, Int, LedgerError,
};
use tracing::{debug, info, warn};

impl Ics20Precompile {
    /// Sends `amount` of `denom` over the source channel and returns the packet
    /// sequence.
    pub(super) fn transfer(
        &self,
        scope: &mut CallScope<'_>,
        call: IICS20::transferCall,
    ) -> Result<Bytes, PrecompileCallError> {
        let msg = msg_transfer_from_call(&call, &self.config.bech32_prefix).map_err(ics20_error)?;
        msg.validate_basic().map_err(ics20_error)?;

        if is_channel_id_format(&msg.source_channel) {
            self.ensure_channel_open(scope.ctx, &msg.source_port, &msg.source_channel)
                .map_err(ics20_error)?;
        } else if validate_client_identifier(&msg.source_channel).is_err() {
            return Err(ics20_error(LedgerError::InvalidChannel(msg.source_channel.clone())));
        }

        let caller = scope.frame.caller;
        if caller != call.sender {
            warn!(
                target: "ics20_precompile",
                %caller,
                sender = %call.sender,
                "transfer requested on behalf of another account"
            );
            return Err(BridgeError::RequesterIsNotMsgSender { caller, sender: call.sender }.into());
        }

        let response = self.keepers.transfer.transfer(scope.ctx, &msg).map_err(ics20_error)?;

        if msg.token.denom == self.config.evm_coin.denom {
            let escrow = escrow_address(&msg.source_port, &msg.source_channel);
            let scaled = self
                .config
                .evm_coin
                .to_18_decimals(call.amount)
                .ok_or(BridgeError::IntegerOverflow(Int::from(call.amount)))?;
            scope.journal.transfer(call.sender, escrow, scaled);
        }

        info!(
            target: "ics20_precompile",
            sender = %call.sender,
            receiver = %msg.receiver,
            port = %msg.source_port,
            channel = %msg.source_channel,
            token = %msg.token,
            sequence = response.sequence,
            "ibc transfer"
        );
        let event = IICS20::IBCTransfer {
            sender: call.sender,
            receiver: keccak256(msg.receiver.as_bytes()),
            sourcePort: msg.source_port,
            sourceChannel: msg.source_channel,
            denom: msg.token.denom,
            amount: call.amount,
            memo: msg.memo,
        };
        scope
            .journal
            .push_log(Log { address: self.config.ics20_address, data: event.encode_log_data() });

        Ok(response.sequence.abi_encode().into())
    }

    /// The v1 path needs an `OPEN` channel whose first connection hop is `OPEN`.
    fn ensure_channel_open(
        &self,
        ctx: &mut Context,
        port: &str,
        channel_id: &str,
    ) -> Result<(), LedgerError> {
        let channel = self.keepers.channels.channel(ctx, port, channel_id)?.ok_or_else(|| {
            LedgerError::ChannelNotFound { port: port.to_string(), channel: channel_id.to_string() }
        })?;
        if channel.state != State::Open {
            return Err(LedgerError::ChannelNotOpen {
                port: port.to_string(),
                channel: channel_id.to_string(),
                state: channel.state.to_string(),
            });
        }

        let connection_id = channel.connection_hops.first().cloned().unwrap_or_default();
        let connection = self
            .keepers
            .channels
            .connection(ctx, &connection_id)?
            .ok_or_else(|| LedgerError::ConnectionNotFound(connection_id.clone()))?;
        if connection.state != State::Open {
            return Err(LedgerError::ConnectionNotOpen {
                connection: connection_id,
                state: connection.state.to_string(),
            });
        }
        debug!(
            target: "ics20_precompile",
            port,
            channel = channel_id,
            connection = %connection_id,
            "channel open"
        );
        Ok(())
    }
}
