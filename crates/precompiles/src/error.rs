//! Precompile error layers and the ledger-to-EVM error translation.
//!
//! Calls fail in one of three ways that are never folded into each other:
//! the calldata does not decode, the operation reverts with a reason from the
//! ERC-20/ICS-20 vocabulary, or the call runs out of gas. Ledger errors reach
//! the EVM only through [`erc20_error`] or [`ics20_error`].

use alloy_evm::revm::precompile::PrecompileError;
use alloy_primitives::{Address, U256};
use bridge_ledger::{Int, LedgerError};
use thiserror::Error;

/// Revert reasons surfaced to EVM callers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    #[error("ERC20: insufficient allowance")]
    InsufficientAllowance,
    #[error("ERC20: transfer amount exceeds balance")]
    TransferAmountExceedsBalance,
    #[error("ERC20: decreased allowance below zero")]
    DecreasedAllowanceBelowZero,
    #[error("cannot approve negative values")]
    NegativeAmount,
    #[error("amount {0} causes integer overflow")]
    IntegerOverflow(Int),
    #[error("cannot increase allowance with non-positive values")]
    IncreaseNonPositiveValue,
    #[error("cannot decrease allowance with non-positive values")]
    DecreaseNonPositiveValue,
    #[error("allowance for token {0} does not exist")]
    NoAllowanceForToken(String),
    /// Metadata lookups that an ERC-20 contract would answer with a bare revert.
    #[error("execution reverted")]
    ExecutionReverted,
    #[error("cannot receive funds, received: {0}")]
    CannotReceiveFunds(U256),
    #[error("requester address {caller} is not the same as sender {sender}")]
    RequesterIsNotMsgSender {
        /// EVM `msg.sender`.
        caller: Address,
        /// Sender named in the call arguments.
        sender: Address,
    },
    #[error("write protection")]
    WriteProtection,
    #[error("account balance {balance} is lower than withdraw balance {amount}")]
    WithdrawExceedsBalance {
        /// Spendable balance of the caller.
        balance: U256,
        /// Requested withdrawal.
        amount: U256,
    },
    #[error(transparent)]
    Ledger(LedgerError),
}

/// Failure of a precompile call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PrecompileCallError {
    /// Calldata did not match any method or its argument types.
    #[error("{0}")]
    Decode(String),
    /// Domain failure; the call reverts with this reason.
    #[error(transparent)]
    Revert(#[from] BridgeError),
    /// Gas exhausted; reported as the EVM's out-of-gas signal.
    #[error("out of gas")]
    OutOfGas,
    /// The EVM journal rejected a mirrored state change.
    #[error("evm state: {0}")]
    State(String),
}

impl PrecompileCallError {
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode(err.to_string())
    }

    /// Maps to the revm error surface.
    pub fn into_precompile_error(self) -> PrecompileError {
        match self {
            Self::OutOfGas => PrecompileError::OutOfGas,
            other => PrecompileError::Other(other.to_string().into()),
        }
    }
}

/// Translation shared by both precompiles: gas exhaustion leaves the domain vocabulary.
fn resource_or(
    err: LedgerError,
    domain: impl FnOnce(LedgerError) -> BridgeError,
) -> PrecompileCallError {
    match err {
        LedgerError::OutOfGas { .. } => PrecompileCallError::OutOfGas,
        other => PrecompileCallError::Revert(domain(other)),
    }
}

/// Maps ledger failures onto the errors an ERC-20 contract raises.
pub fn erc20_error(err: LedgerError) -> PrecompileCallError {
    resource_or(err, |err| match err {
        LedgerError::InsufficientFunds { .. } => BridgeError::TransferAmountExceedsBalance,
        LedgerError::NoIbcVoucherDenom(_)
        | LedgerError::DenomNotFound
        | LedgerError::InvalidBaseDenom(_)
        | LedgerError::InvalidDecimals(_) => BridgeError::ExecutionReverted,
        other => BridgeError::Ledger(other),
    })
}

/// Maps ledger failures for the ICS-20 precompile; domain errors pass through.
pub fn ics20_error(err: LedgerError) -> PrecompileCallError {
    resource_or(err, BridgeError::Ledger)
}
