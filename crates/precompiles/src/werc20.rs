//! Wrapped native coin precompile.
//!
//! Installed at the native coin's token pair address in place of the plain
//! ERC-20 precompile and answers every ERC-20 method through it. The native coin
//! and its wrapped token are one ledger balance, so `deposit` hands the received
//! value straight back to the caller and `withdraw` only checks that the caller
//! could cover it. Both emit the WETH events.

use crate::{
    abi::{
        IERC20::IERC20Calls,
        IWERC20::{self, IWERC20Calls},
    },
    erc20::{Erc20Method, Erc20Precompile},
    error::{erc20_error, BridgeError, PrecompileCallError},
    gas,
    runner::{self, BridgePrecompile, CallScope, PrecompileMethod},
};
use alloy::sol_types::{SolCall, SolEvent, SolInterface};
use alloy_evm::{
    precompiles::{Precompile, PrecompileInput},
    revm::precompile::{PrecompileId, PrecompileResult},
};
use alloy_primitives::{Address, Bytes, Log, U256};
use bridge_ledger::GasConfig;
use std::sync::OnceLock;
use tracing::info;

/// Methods of the WERC20 precompile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Werc20Method {
    /// `deposit()`, also reached by calldata-less calls.
    Deposit,
    Withdraw,
    Erc20(Erc20Method),
}

impl Werc20Method {
    /// Fixed gas charged for the method.
    pub const fn required_gas(&self) -> u64 {
        match self {
            Self::Deposit => gas::GAS_DEPOSIT,
            Self::Withdraw => gas::GAS_WITHDRAW,
            Self::Erc20(method) => method.required_gas(),
        }
    }
}

impl PrecompileMethod for Werc20Method {
    const ALL: &'static [Self] = &[
        Self::Deposit,
        Self::Withdraw,
        Self::Erc20(Erc20Method::Transfer),
        Self::Erc20(Erc20Method::TransferFrom),
        Self::Erc20(Erc20Method::Approve),
        Self::Erc20(Erc20Method::IncreaseAllowance),
        Self::Erc20(Erc20Method::DecreaseAllowance),
        Self::Erc20(Erc20Method::Name),
        Self::Erc20(Erc20Method::Symbol),
        Self::Erc20(Erc20Method::Decimals),
        Self::Erc20(Erc20Method::TotalSupply),
        Self::Erc20(Erc20Method::BalanceOf),
        Self::Erc20(Erc20Method::Allowance),
    ];

    fn selector(&self) -> [u8; 4] {
        match self {
            Self::Deposit => IWERC20::depositCall::SELECTOR,
            Self::Withdraw => IWERC20::withdrawCall::SELECTOR,
            Self::Erc20(method) => method.selector(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdraw => "withdraw",
            Self::Erc20(method) => method.name(),
        }
    }

    fn is_transaction(&self) -> bool {
        match self {
            Self::Deposit | Self::Withdraw => true,
            Self::Erc20(method) => method.is_transaction(),
        }
    }

    fn is_payable(&self) -> bool {
        matches!(self, Self::Deposit)
    }

    /// Empty calldata is a plain value transfer and deposits it.
    fn from_input(input: &[u8]) -> Option<Self> {
        if input.is_empty() {
            return Some(Self::Deposit);
        }
        let selector: [u8; 4] = input.get(..4)?.try_into().ok()?;
        Self::from_selector(selector)
    }
}

/// Decoded WERC20 call.
#[derive(Debug)]
pub enum Werc20Call {
    Deposit,
    Withdraw(U256),
    Erc20(IERC20Calls),
}

/// WERC20 view of the native coin pair.
#[derive(Clone, Debug)]
pub struct Werc20Precompile {
    erc20: Erc20Precompile,
}

impl Werc20Precompile {
    pub fn id() -> &'static PrecompileId {
        static ID: OnceLock<PrecompileId> = OnceLock::new();
        ID.get_or_init(|| PrecompileId::custom("werc20_bridge"))
    }

    pub const fn new(erc20: Erc20Precompile) -> Self {
        Self { erc20 }
    }

    /// The ERC-20 precompile serving the token methods.
    pub const fn erc20(&self) -> &Erc20Precompile {
        &self.erc20
    }

    fn deposit(&self, scope: &mut CallScope<'_>) -> Bytes {
        let caller = scope.frame.caller;
        let value = scope.frame.value;
        if !value.is_zero() {
            scope.journal.transfer(self.address(), caller, value);
        }
        info!(target: "werc20_precompile", %caller, %value, "deposit");
        scope.journal.push_log(Log {
            address: self.address(),
            data: IWERC20::Deposit { dst: caller, wad: value }.encode_log_data(),
        });
        Bytes::new()
    }

    fn withdraw(&self, scope: &mut CallScope<'_>, wad: U256) -> Result<Bytes, PrecompileCallError> {
        let caller = scope.frame.caller;
        let denom = &self.erc20.token_pair().denom;
        let balance = self
            .erc20
            .keepers()
            .bank
            .spendable_balance(scope.ctx, caller, denom)
            .map_err(erc20_error)?;
        if balance < wad {
            return Err(BridgeError::WithdrawExceedsBalance { balance, amount: wad }.into());
        }
        info!(target: "werc20_precompile", %caller, %wad, "withdraw");
        scope.journal.push_log(Log {
            address: self.address(),
            data: IWERC20::Withdrawal { src: caller, wad }.encode_log_data(),
        });
        Ok(Bytes::new())
    }
}

impl BridgePrecompile for Werc20Precompile {
    type Method = Werc20Method;
    type Call = Werc20Call;

    fn address(&self) -> Address {
        self.erc20.address()
    }

    fn gas_config(&self) -> GasConfig {
        GasConfig::free()
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        Werc20Method::from_input(input).map_or(0, |method| method.required_gas())
    }

    fn decode(&self, input: &[u8]) -> Result<(Werc20Method, Werc20Call), PrecompileCallError> {
        if input.is_empty() {
            return Ok((Werc20Method::Deposit, Werc20Call::Deposit));
        }
        match Werc20Method::from_input(input) {
            Some(Werc20Method::Deposit | Werc20Method::Withdraw) => {
                match IWERC20Calls::abi_decode(input).map_err(PrecompileCallError::decode)? {
                    IWERC20Calls::deposit(_) => Ok((Werc20Method::Deposit, Werc20Call::Deposit)),
                    IWERC20Calls::withdraw(call) => {
                        Ok((Werc20Method::Withdraw, Werc20Call::Withdraw(call.wad)))
                    }
                }
            }
            _ => {
                let (method, call) = self.erc20.decode(input)?;
                Ok((Werc20Method::Erc20(method), Werc20Call::Erc20(call)))
            }
        }
    }

    fn execute_method(
        &self,
        scope: &mut CallScope<'_>,
        _method: Werc20Method,
        call: Werc20Call,
    ) -> Result<Bytes, PrecompileCallError> {
        match call {
            Werc20Call::Deposit => Ok(self.deposit(scope)),
            Werc20Call::Withdraw(wad) => self.withdraw(scope, wad),
            Werc20Call::Erc20(call) => {
                self.erc20.execute_method(scope, Erc20Method::of(&call), call)
            }
        }
    }
}

impl Precompile for Werc20Precompile {
    fn precompile_id(&self) -> &PrecompileId {
        Self::id()
    }

    fn call(&self, input: PrecompileInput<'_>) -> PrecompileResult {
        runner::run(self, self.erc20.ctx(), input)
    }

    fn is_pure(&self) -> bool {
        false
    }
}
