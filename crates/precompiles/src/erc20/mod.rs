//! ERC-20 precompile for a native ledger coin.
//!
//! One instance serves one [`TokenPair`]: calls at the pair's ERC-20 address move
//! the pair's bank denomination through the bank message server and keep
//! allowances in the ledger's allowance store.

mod approve;
mod events;
mod query;
mod tx;

use crate::{
    abi::IERC20::{self, IERC20Calls},
    config::BridgeConfig,
    error::PrecompileCallError,
    gas,
    registry::Keepers,
    runner::{self, BridgePrecompile, CallScope, PrecompileMethod},
};
use alloy::sol_types::{SolCall, SolInterface, SolValue};
use alloy_evm::{
    precompiles::{Precompile, PrecompileInput},
    revm::precompile::{PrecompileId, PrecompileResult},
};
use alloy_primitives::{Address, Bytes};
use bridge_ledger::{GasConfig, SharedContext, TokenPair};
use std::sync::OnceLock;

/// Methods of the ERC-20 precompile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Erc20Method {
    Transfer,
    TransferFrom,
    Approve,
    IncreaseAllowance,
    DecreaseAllowance,
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf,
    Allowance,
}

impl Erc20Method {
    /// Fixed gas charged for the method.
    pub const fn required_gas(&self) -> u64 {
        match self {
            Self::Transfer => gas::GAS_TRANSFER,
            Self::TransferFrom => gas::GAS_TRANSFER_FROM,
            Self::Approve => gas::GAS_APPROVE,
            Self::IncreaseAllowance => gas::GAS_INCREASE_ALLOWANCE,
            Self::DecreaseAllowance => gas::GAS_DECREASE_ALLOWANCE,
            Self::Name => gas::GAS_NAME,
            Self::Symbol => gas::GAS_SYMBOL,
            Self::Decimals => gas::GAS_DECIMALS,
            Self::TotalSupply => gas::GAS_TOTAL_SUPPLY,
            Self::BalanceOf => gas::GAS_BALANCE_OF,
            Self::Allowance => gas::GAS_ALLOWANCE,
        }
    }

    pub(crate) const fn of(call: &IERC20Calls) -> Self {
        match call {
            IERC20Calls::transfer(_) => Self::Transfer,
            IERC20Calls::transferFrom(_) => Self::TransferFrom,
            IERC20Calls::approve(_) => Self::Approve,
            IERC20Calls::increaseAllowance(_) => Self::IncreaseAllowance,
            IERC20Calls::decreaseAllowance(_) => Self::DecreaseAllowance,
            IERC20Calls::name(_) => Self::Name,
            IERC20Calls::symbol(_) => Self::Symbol,
            IERC20Calls::decimals(_) => Self::Decimals,
            IERC20Calls::totalSupply(_) => Self::TotalSupply,
            IERC20Calls::balanceOf(_) => Self::BalanceOf,
            IERC20Calls::allowance(_) => Self::Allowance,
        }
    }
}

impl PrecompileMethod for Erc20Method {
    const ALL: &'static [Self] = &[
        Self::Transfer,
        Self::TransferFrom,
        Self::Approve,
        Self::IncreaseAllowance,
        Self::DecreaseAllowance,
        Self::Name,
        Self::Symbol,
        Self::Decimals,
        Self::TotalSupply,
        Self::BalanceOf,
        Self::Allowance,
    ];

    fn selector(&self) -> [u8; 4] {
        match self {
            Self::Transfer => IERC20::transferCall::SELECTOR,
            Self::TransferFrom => IERC20::transferFromCall::SELECTOR,
            Self::Approve => IERC20::approveCall::SELECTOR,
            Self::IncreaseAllowance => IERC20::increaseAllowanceCall::SELECTOR,
            Self::DecreaseAllowance => IERC20::decreaseAllowanceCall::SELECTOR,
            Self::Name => IERC20::nameCall::SELECTOR,
            Self::Symbol => IERC20::symbolCall::SELECTOR,
            Self::Decimals => IERC20::decimalsCall::SELECTOR,
            Self::TotalSupply => IERC20::totalSupplyCall::SELECTOR,
            Self::BalanceOf => IERC20::balanceOfCall::SELECTOR,
            Self::Allowance => IERC20::allowanceCall::SELECTOR,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::TransferFrom => "transferFrom",
            Self::Approve => "approve",
            Self::IncreaseAllowance => "increaseAllowance",
            Self::DecreaseAllowance => "decreaseAllowance",
            Self::Name => "name",
            Self::Symbol => "symbol",
            Self::Decimals => "decimals",
            Self::TotalSupply => "totalSupply",
            Self::BalanceOf => "balanceOf",
            Self::Allowance => "allowance",
        }
    }

    fn is_transaction(&self) -> bool {
        matches!(
            self,
            Self::Transfer
                | Self::TransferFrom
                | Self::Approve
                | Self::IncreaseAllowance
                | Self::DecreaseAllowance
        )
    }
}

/// ERC-20 view of one token pair.
#[derive(Clone, Debug)]
pub struct Erc20Precompile {
    pair: TokenPair,
    config: BridgeConfig,
    keepers: Keepers,
    ctx: SharedContext,
}

impl Erc20Precompile {
    // Use a lazily-initialized static for the ID since `custom` is not const.
    pub fn id() -> &'static PrecompileId {
        static ID: OnceLock<PrecompileId> = OnceLock::new();
        ID.get_or_init(|| PrecompileId::custom("erc20_bridge"))
    }

    pub fn new(
        pair: TokenPair,
        config: BridgeConfig,
        keepers: Keepers,
        ctx: SharedContext,
    ) -> Self {
        Self { pair, config, keepers, ctx }
    }

    pub const fn token_pair(&self) -> &TokenPair {
        &self.pair
    }

    pub(crate) const fn keepers(&self) -> &Keepers {
        &self.keepers
    }

    pub(crate) const fn ctx(&self) -> &SharedContext {
        &self.ctx
    }

    /// Whether the pair's denomination is the coin backing native EVM balances.
    pub(crate) fn is_evm_coin(&self) -> bool {
        self.pair.denom == self.config.evm_coin.denom
    }
}

fn encode_bool(value: bool) -> Bytes {
    value.abi_encode().into()
}

impl BridgePrecompile for Erc20Precompile {
    type Method = Erc20Method;
    type Call = IERC20Calls;

    fn address(&self) -> Address {
        self.pair.erc20_address
    }

    fn gas_config(&self) -> GasConfig {
        GasConfig::free()
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        Erc20Method::from_input(input).map_or(0, |method| method.required_gas())
    }

    fn decode(&self, input: &[u8]) -> Result<(Erc20Method, IERC20Calls), PrecompileCallError> {
        let call = IERC20Calls::abi_decode(input).map_err(PrecompileCallError::decode)?;
        Ok((Erc20Method::of(&call), call))
    }

    fn execute_method(
        &self,
        scope: &mut CallScope<'_>,
        _method: Erc20Method,
        call: IERC20Calls,
    ) -> Result<Bytes, PrecompileCallError> {
        let caller = scope.frame.caller;
        match call {
            IERC20Calls::transfer(call) => {
                self.transfer(scope, caller, call.to, call.amount, false).map(encode_bool)
            }
            IERC20Calls::transferFrom(call) => {
                self.transfer(scope, call.from, call.to, call.amount, true).map(encode_bool)
            }
            IERC20Calls::approve(call) => {
                self.approve(scope, call.spender, call.amount).map(encode_bool)
            }
            IERC20Calls::increaseAllowance(call) => {
                self.increase_allowance(scope, call.spender, call.addedValue).map(encode_bool)
            }
            IERC20Calls::decreaseAllowance(call) => {
                self.decrease_allowance(scope, call.spender, call.subtractedValue).map(encode_bool)
            }
            IERC20Calls::name(_) => Ok(self.name(scope.ctx)?.abi_encode().into()),
            IERC20Calls::symbol(_) => Ok(self.symbol(scope.ctx)?.abi_encode().into()),
            IERC20Calls::decimals(_) => {
                let decimals = self.decimals(scope.ctx)?;
                Ok(IERC20::decimalsCall::abi_encode_returns(&decimals).into())
            }
            IERC20Calls::totalSupply(_) => Ok(self.total_supply(scope.ctx)?.abi_encode().into()),
            IERC20Calls::balanceOf(call) => {
                Ok(self.balance_of(scope.ctx, call.account)?.abi_encode().into())
            }
            IERC20Calls::allowance(call) => {
                Ok(self.allowance(scope.ctx, call.owner, call.spender)?.abi_encode().into())
            }
        }
    }
}

impl Precompile for Erc20Precompile {
    fn precompile_id(&self) -> &PrecompileId {
        Self::id()
    }

    fn call(&self, input: PrecompileInput<'_>) -> PrecompileResult {
        runner::run(self, &self.ctx, input)
    }

    fn is_pure(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gas_table_by_selector() {
        let input =
            IERC20::transferCall { to: Address::ZERO, amount: Default::default() }.abi_encode();
        assert_eq!(Erc20Method::from_input(&input), Some(Erc20Method::Transfer));
        assert_eq!(Erc20Method::from_input(&input).map(|m| m.required_gas()), Some(9_000));

        let input = IERC20::decimalsCall {}.abi_encode();
        assert_eq!(Erc20Method::from_input(&input).map(|m| m.required_gas()), Some(427));
    }

    #[test]
    fn unknown_or_short_input_costs_nothing() {
        assert_eq!(Erc20Method::from_input(&[0xa9, 0x05]), None);
        assert_eq!(Erc20Method::from_input(&[0xde, 0xad, 0xbe, 0xef]), None);
        assert_eq!(Erc20Method::from_input(&[]), None);
    }

    #[test]
    fn transactions_and_queries() {
        let writes: Vec<_> =
            Erc20Method::ALL.iter().filter(|method| method.is_transaction()).collect();
        assert_eq!(writes.len(), 5);
        assert!(!Erc20Method::BalanceOf.is_transaction());
        assert_eq!(Erc20Method::TransferFrom.name(), "transferFrom");
    }
}
