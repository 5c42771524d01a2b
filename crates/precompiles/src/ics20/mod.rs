//! ICS-20 precompile: outbound IBC transfers and denomination trace queries.

mod query;
mod tx;
mod types;

use crate::{
    abi::IICS20::{self, IICS20Calls},
    config::BridgeConfig,
    error::PrecompileCallError,
    gas::kv_required_gas,
    registry::Keepers,
    runner::{self, BridgePrecompile, CallScope, PrecompileMethod},
};
use alloy::sol_types::{SolCall, SolInterface};
use alloy_evm::{
    precompiles::{Precompile, PrecompileInput},
    revm::precompile::{PrecompileId, PrecompileResult},
};
use alloy_primitives::{address, Address, Bytes};
use bridge_ledger::{GasConfig, SharedContext};
use std::sync::OnceLock;

pub use types::{denom_to_abi, msg_transfer_from_call};

/// Default address of the ICS-20 precompile.
pub const ICS20_PRECOMPILE_ADDR: Address = address!("0x0000000000000000000000000000000000000802");

/// Methods of the ICS-20 precompile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Ics20Method {
    Transfer,
    Denom,
    Denoms,
    DenomHash,
}

impl Ics20Method {
    const fn of(call: &IICS20Calls) -> Self {
        match call {
            IICS20Calls::transfer(_) => Self::Transfer,
            IICS20Calls::denom(_) => Self::Denom,
            IICS20Calls::denoms(_) => Self::Denoms,
            IICS20Calls::denomHash(_) => Self::DenomHash,
        }
    }
}

impl PrecompileMethod for Ics20Method {
    const ALL: &'static [Self] = &[Self::Transfer, Self::Denom, Self::Denoms, Self::DenomHash];

    fn selector(&self) -> [u8; 4] {
        match self {
            Self::Transfer => IICS20::transferCall::SELECTOR,
            Self::Denom => IICS20::denomCall::SELECTOR,
            Self::Denoms => IICS20::denomsCall::SELECTOR,
            Self::DenomHash => IICS20::denomHashCall::SELECTOR,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Denom => "denom",
            Self::Denoms => "denoms",
            Self::DenomHash => "denomHash",
        }
    }

    fn is_transaction(&self) -> bool {
        matches!(self, Self::Transfer)
    }
}

/// IBC transfer gateway backed by the transfer and channel keepers.
#[derive(Clone, Debug)]
pub struct Ics20Precompile {
    config: BridgeConfig,
    keepers: Keepers,
    ctx: SharedContext,
}

impl Ics20Precompile {
    // Use a lazily-initialized static for the ID since `custom` is not const.
    pub fn id() -> &'static PrecompileId {
        static ID: OnceLock<PrecompileId> = OnceLock::new();
        ID.get_or_init(|| PrecompileId::custom("ics20"))
    }

    pub fn new(config: BridgeConfig, keepers: Keepers, ctx: SharedContext) -> Self {
        Self { config, keepers, ctx }
    }
}

impl BridgePrecompile for Ics20Precompile {
    type Method = Ics20Method;
    type Call = IICS20Calls;

    fn address(&self) -> Address {
        self.config.ics20_address
    }

    fn gas_config(&self) -> GasConfig {
        GasConfig::kv()
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        Ics20Method::from_input(input).map_or(0, |method| {
            kv_required_gas(&self.gas_config(), input, method.is_transaction())
        })
    }

    fn decode(&self, input: &[u8]) -> Result<(Ics20Method, IICS20Calls), PrecompileCallError> {
        let call = IICS20Calls::abi_decode(input).map_err(PrecompileCallError::decode)?;
        Ok((Ics20Method::of(&call), call))
    }

    fn execute_method(
        &self,
        scope: &mut CallScope<'_>,
        _method: Ics20Method,
        call: IICS20Calls,
    ) -> Result<Bytes, PrecompileCallError> {
        match call {
            IICS20Calls::transfer(call) => self.transfer(scope, call),
            IICS20Calls::denom(call) => self.denom(scope.ctx, &call.hash),
            IICS20Calls::denoms(call) => self.denoms(scope.ctx, call.pageRequest),
            IICS20Calls::denomHash(call) => self.denom_hash(scope.ctx, &call.trace),
        }
    }
}

impl Precompile for Ics20Precompile {
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
