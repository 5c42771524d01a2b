//! Allowance state machine.
//!
//! Every mutation goes through [`Erc20Precompile::set_or_clear_allowance`], so a
//! zero allowance is never left in the store.

use super::{events::approval_log, Erc20Precompile};
use crate::{
    error::{erc20_error, BridgeError, PrecompileCallError},
    runner::CallScope,
};
use alloy_primitives::{Address, U256};
use bridge_ledger::{math::MAX_BIT_LEN, Context, Int};
use core::cmp::Ordering;
use tracing::{debug, info};

impl Erc20Precompile {
    pub(super) fn approve(
        &self,
        scope: &mut CallScope<'_>,
        spender: Address,
        amount: U256,
    ) -> Result<bool, PrecompileCallError> {
        let owner = scope.frame.caller;
        let current = self.stored_allowance(scope.ctx, owner, spender)?;
        let requested = Int::from(amount);

        match approval_target(current, requested)? {
            Some(value) => {
                self.set_or_clear_allowance(scope.ctx, owner, spender, value)?;
            }
            None => {
                debug!(
                    target: "erc20_precompile",
                    %owner,
                    %spender,
                    "approve to zero without allowance"
                );
            }
        }

        info!(
            target: "erc20_precompile",
            token = %self.pair.denom,
            %owner,
            %spender,
            %amount,
            "approve"
        );
        scope.journal.push_log(approval_log(self.pair.erc20_address, owner, spender, amount));
        Ok(true)
    }

    pub(super) fn increase_allowance(
        &self,
        scope: &mut CallScope<'_>,
        spender: Address,
        added: U256,
    ) -> Result<bool, PrecompileCallError> {
        let owner = scope.frame.caller;
        let current = self.stored_allowance(scope.ctx, owner, spender)?;
        let added = Int::from(added);
        if !added.is_positive() {
            return Err(BridgeError::IncreaseNonPositiveValue.into());
        }

        let updated =
            self.set_or_clear_allowance(scope.ctx, owner, spender, Int::from(current) + added)?;
        info!(
            target: "erc20_precompile",
            token = %self.pair.denom,
            %owner,
            %spender,
            allowance = %updated,
            "increase allowance"
        );
        scope.journal.push_log(approval_log(self.pair.erc20_address, owner, spender, updated));
        Ok(true)
    }

    pub(super) fn decrease_allowance(
        &self,
        scope: &mut CallScope<'_>,
        spender: Address,
        subtracted: U256,
    ) -> Result<bool, PrecompileCallError> {
        let owner = scope.frame.caller;
        let current = self.stored_allowance(scope.ctx, owner, spender)?;
        if subtracted.is_zero() {
            return Err(BridgeError::DecreaseNonPositiveValue.into());
        }
        if current.is_zero() {
            return Err(BridgeError::NoAllowanceForToken(self.pair.denom.clone()).into());
        }

        let updated = match subtracted.cmp(&current) {
            Ordering::Greater => return Err(BridgeError::DecreasedAllowanceBelowZero.into()),
            _ => self.set_or_clear_allowance(
                scope.ctx,
                owner,
                spender,
                Int::from(current) - Int::from(subtracted),
            )?,
        };
        info!(
            target: "erc20_precompile",
            token = %self.pair.denom,
            %owner,
            %spender,
            allowance = %updated,
            "decrease allowance"
        );
        scope.journal.push_log(approval_log(self.pair.erc20_address, owner, spender, updated));
        Ok(true)
    }

    pub(super) fn stored_allowance(
        &self,
        ctx: &mut Context,
        owner: Address,
        spender: Address,
    ) -> Result<U256, PrecompileCallError> {
        let allowance = self
            .keepers
            .allowances
            .allowance(ctx, self.pair.erc20_address, owner, spender)
            .map_err(erc20_error)?;
        debug!(target: "erc20_precompile", %owner, %spender, %allowance, "allowance lookup");
        Ok(allowance)
    }

    /// Stores `value` as the allowance, removing the entry when it is zero.
    ///
    /// Values below zero or wider than 256 bits are rejected without touching
    /// the store. Returns the stored amount.
    pub(super) fn set_or_clear_allowance(
        &self,
        ctx: &mut Context,
        owner: Address,
        spender: Address,
        value: Int,
    ) -> Result<U256, PrecompileCallError> {
        if value.is_negative() {
            return Err(BridgeError::NegativeAmount.into());
        }
        if value.bit_len() > MAX_BIT_LEN {
            return Err(BridgeError::IntegerOverflow(value).into());
        }
        let token = self.pair.erc20_address;
        let allowances = &self.keepers.allowances;
        if value.is_zero() {
            allowances.delete_allowance(ctx, token, owner, spender).map_err(erc20_error)?;
        } else {
            allowances.set_allowance(ctx, token, owner, spender, &value).map_err(erc20_error)?;
        }
        value.to_u256().ok_or_else(|| BridgeError::IntegerOverflow(value).into())
    }
}

/// New allowance for an approval of `requested` over `current`; `None` leaves the
/// store untouched.
fn approval_target(current: U256, requested: Int) -> Result<Option<Int>, BridgeError> {
    match (current.is_zero(), requested.signum()) {
        (true, s) if s < 0 => Err(BridgeError::NegativeAmount),
        (true, 0) => Ok(None),
        (false, s) if s <= 0 => Ok(Some(Int::ZERO)),
        _ => Ok(Some(requested)),
    }
}
