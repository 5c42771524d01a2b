//! Deferred EVM state changes of a precompile call.
//!
//! Balance mirrors of native-coin moves and the call's logs are queued while the
//! ledger operation runs and written into the EVM journal only once the call has
//! succeeded and paid for its gas.

use crate::error::PrecompileCallError;
use alloy_evm::{EvmInternals, EvmInternalsError};
use alloy_primitives::{Address, Log, U256};

/// Direction of a [`BalanceChange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BalanceOp {
    Add,
    Sub,
}

/// One native balance delta, in the EVM's 18-decimal unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BalanceChange {
    pub account: Address,
    pub amount: U256,
    pub op: BalanceOp,
}

/// EVM side effects queued by one call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallJournal {
    balance_changes: Vec<BalanceChange>,
    logs: Vec<Log>,
}

impl CallJournal {
    /// Queues a credit of `amount` to `account`.
    pub fn add_balance(&mut self, account: Address, amount: U256) {
        self.balance_changes.push(BalanceChange { account, amount, op: BalanceOp::Add });
    }

    /// Queues a debit of `amount` from `account`.
    pub fn sub_balance(&mut self, account: Address, amount: U256) {
        self.balance_changes.push(BalanceChange { account, amount, op: BalanceOp::Sub });
    }

    /// Debit `from` and credit `to`.
    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) {
        self.sub_balance(from, amount);
        self.add_balance(to, amount);
    }

    /// Queues a log, emitted in push order.
    pub fn push_log(&mut self, log: Log) {
        self.logs.push(log);
    }

    /// Balance changes in the order they will be applied.
    pub fn balance_changes(&self) -> &[BalanceChange] {
        &self.balance_changes
    }

    /// Queued logs.
    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Writes the queued balance changes and logs into the EVM journal.
    pub fn apply(&self, internals: &mut EvmInternals<'_>) -> Result<(), PrecompileCallError> {
        for change in &self.balance_changes {
            ensure_account_created(internals, change.account)?;
            let account = internals.load_account(change.account).map_err(map_internals_error)?;
            let balance = account.info.balance;
            let new_balance = match change.op {
                BalanceOp::Add => balance.checked_add(change.amount),
                BalanceOp::Sub => balance.checked_sub(change.amount),
            }
            .ok_or_else(|| {
                PrecompileCallError::State(format!(
                    "balance {balance} of {} cannot apply {:?} of {}",
                    change.account, change.op, change.amount
                ))
            })?;
            internals.set_balance(change.account, new_balance).map_err(map_internals_error)?;
            internals.touch_account(change.account).map_err(map_internals_error)?;
        }
        for log in &self.logs {
            internals.log(log.clone());
        }
        Ok(())
    }
}

fn ensure_account_created(
    internals: &mut EvmInternals<'_>,
    addr: Address,
) -> Result<(), PrecompileCallError> {
    let account = internals.load_account(addr).map_err(map_internals_error)?;
    if account.is_loaded_as_not_existing() {
        internals.touch_account(addr).map_err(map_internals_error)?;
    }
    Ok(())
}

fn map_internals_error(err: EvmInternalsError) -> PrecompileCallError {
    PrecompileCallError::State(err.to_string())
}
