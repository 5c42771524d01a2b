use super::{
    events::{approval_log, transfer_log},
    Erc20Precompile,
};
use crate::{
    error::{erc20_error, BridgeError, PrecompileCallError},
    runner::CallScope,
};
use alloy_primitives::{Address, U256};
use bridge_ledger::{Coin, Int, MsgSend};
use tracing::info;

impl Erc20Precompile {
    /// Moves `amount` from `from` to `to`.
    ///
    /// For `transferFrom` a caller other than `from` spends its allowance before
    /// any balance moves, and the remaining allowance is reported in an
    /// `Approval` log after the `Transfer` log.
    pub(super) fn transfer(
        &self,
        scope: &mut CallScope<'_>,
        from: Address,
        to: Address,
        amount: U256,
        transfer_from: bool,
    ) -> Result<bool, PrecompileCallError> {
        let msg = MsgSend { from, to, amount: Coin::new(self.pair.denom.clone(), amount) };
        msg.validate_basic().map_err(erc20_error)?;

        let spender = scope.frame.caller;
        let remaining = if !transfer_from {
            None
        } else if spender != from {
            let current = self.stored_allowance(scope.ctx, from, spender)?;
            let updated = Int::from(current) - Int::from(amount);
            if updated.is_negative() {
                return Err(BridgeError::InsufficientAllowance.into());
            }
            Some(self.set_or_clear_allowance(scope.ctx, from, spender, updated)?)
        } else {
            Some(self.stored_allowance(scope.ctx, from, spender)?)
        };

        self.keepers.bank_send.send(scope.ctx, &msg).map_err(erc20_error)?;

        if self.is_evm_coin() {
            let scaled = self
                .config
                .evm_coin
                .to_18_decimals(amount)
                .ok_or(BridgeError::IntegerOverflow(Int::from(amount)))?;
            scope.journal.transfer(from, to, scaled);
        }

        info!(
            target: "erc20_precompile",
            token = %self.pair.denom,
            %from,
            %to,
            %amount,
            %spender,
            "transfer"
        );
        let token = self.pair.erc20_address;
        scope.journal.push_log(transfer_log(token, from, to, amount));
        if let Some(remaining) = remaining {
            scope.journal.push_log(approval_log(token, from, spender, remaining));
        }
        Ok(true)
    }
}
