use super::Erc20Precompile;
use crate::error::{erc20_error, BridgeError, PrecompileCallError};
use alloy_primitives::{Address, U256};
use bridge_ledger::{ibc::derive_decimals_from_denom, Context, DenomMetadata};

impl Erc20Precompile {
    pub(super) fn name(&self, ctx: &mut Context) -> Result<String, PrecompileCallError> {
        if let Some(metadata) = self.metadata(ctx)? {
            return Ok(metadata.name);
        }
        let base = self.voucher_base(ctx)?;
        Ok(format!("{} IBC", unscaled_upper(&base)?))
    }

    pub(super) fn symbol(&self, ctx: &mut Context) -> Result<String, PrecompileCallError> {
        if let Some(metadata) = self.metadata(ctx)? {
            return Ok(metadata.symbol);
        }
        let base = self.voucher_base(ctx)?;
        unscaled_upper(&base)
    }

    pub(super) fn decimals(&self, ctx: &mut Context) -> Result<u8, PrecompileCallError> {
        if let Some(metadata) = self.metadata(ctx)? {
            let exponent = metadata.display_exponent().ok_or(BridgeError::ExecutionReverted)?;
            return u8::try_from(exponent).map_err(|_| BridgeError::ExecutionReverted.into());
        }
        let base = self.voucher_base(ctx)?;
        derive_decimals_from_denom(&base).map_err(erc20_error)
    }

    pub(super) fn total_supply(&self, ctx: &mut Context) -> Result<U256, PrecompileCallError> {
        self.keepers.bank.supply(ctx, &self.pair.denom).map_err(erc20_error)
    }

    pub(super) fn balance_of(
        &self,
        ctx: &mut Context,
        account: Address,
    ) -> Result<U256, PrecompileCallError> {
        self.keepers.bank.spendable_balance(ctx, account, &self.pair.denom).map_err(erc20_error)
    }

    pub(super) fn allowance(
        &self,
        ctx: &mut Context,
        owner: Address,
        spender: Address,
    ) -> Result<U256, PrecompileCallError> {
        self.stored_allowance(ctx, owner, spender)
    }

    fn metadata(&self, ctx: &mut Context) -> Result<Option<DenomMetadata>, PrecompileCallError> {
        self.keepers.bank.denom_metadata(ctx, &self.pair.denom).map_err(erc20_error)
    }

    /// Base denomination of the pair's IBC voucher trace.
    fn voucher_base(&self, ctx: &mut Context) -> Result<String, PrecompileCallError> {
        if !self.pair.denom.starts_with("ibc/") {
            return Err(BridgeError::ExecutionReverted.into());
        }
        let denom = self.keepers.transfer.denom(ctx, &self.pair.denom).map_err(erc20_error)?;
        Ok(denom.base)
    }
}

/// `uatom` becomes `ATOM`.
fn unscaled_upper(base: &str) -> Result<String, PrecompileCallError> {
    let mut chars = base.chars();
    match chars.next() {
        Some(_) if !chars.as_str().is_empty() => Ok(chars.as_str().to_uppercase()),
        _ => Err(BridgeError::ExecutionReverted.into()),
    }
}
