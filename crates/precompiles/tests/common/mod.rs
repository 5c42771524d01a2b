#![allow(dead_code, unreachable_pub, missing_docs)]

use alloy_primitives::{address, Address, U256};
use bridge_ledger::{
    BlockHeader, Context, Erc20Keeper, MemoryBank, Owner, SharedContext, TokenPair,
};
use bridge_precompiles::{
    journal::CallJournal,
    runner::{execute, BridgePrecompile, CallFrame, CallOutcome},
    BridgeConfig, Erc20Precompile, EvmCoinInfo, Ics20Precompile, Keepers, PrecompileCallError,
};

pub const OWNER: Address = address!("0x00000000000000000000000000000000000000a1");
pub const SPENDER: Address = address!("0x00000000000000000000000000000000000000b1");
pub const RECEIVER: Address = address!("0x00000000000000000000000000000000000000c1");

/// ERC-20 address of the native coin pair.
pub const NATIVE_TOKEN: Address = address!("0xd4949664cd82660aae99bedc034a0dea8a0bd517");
pub const EVM_DENOM: &str = "aevmos";

pub const GAS_LIMIT: u64 = 10_000_000;

pub type CallResult = Result<CallOutcome, PrecompileCallError>;

pub struct Harness {
    pub ctx: SharedContext,
    pub bank: MemoryBank,
    pub keepers: Keepers,
    pub config: BridgeConfig,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_bank(MemoryBank::new())
    }

    pub fn with_bank(bank: MemoryBank) -> Self {
        let header = BlockHeader { chain_id: "evmos_9001-1".to_string(), height: 1, time: 0 };
        Self {
            ctx: SharedContext::new(Context::new(header)),
            keepers: Keepers::in_memory(bank.clone()),
            bank,
            config: BridgeConfig::new(EvmCoinInfo::new(EVM_DENOM, EVM_DENOM, 18), "evmos"),
        }
    }

    /// Registers `pair` and returns its precompile.
    pub fn erc20(&self, pair: TokenPair) -> Erc20Precompile {
        Erc20Keeper.register_token_pair(&mut self.ctx.lock(), &pair).unwrap();
        Erc20Precompile::new(pair, self.config.clone(), self.keepers.clone(), self.ctx.clone())
    }

    pub fn native_erc20(&self) -> Erc20Precompile {
        self.erc20(TokenPair::new(NATIVE_TOKEN, EVM_DENOM, Owner::Module))
    }

    pub fn ics20(&self) -> Ics20Precompile {
        Ics20Precompile::new(self.config.clone(), self.keepers.clone(), self.ctx.clone())
    }

    pub fn mint(&self, to: Address, denom: &str, amount: u64) {
        self.bank.mint(&mut self.ctx.lock(), to, denom, U256::from(amount)).unwrap();
    }

    pub fn balance(&self, address: Address, denom: &str) -> U256 {
        use bridge_ledger::BankKeeper;
        self.bank.balance(&mut self.ctx.lock(), address, denom).unwrap()
    }

    pub fn call<P: BridgePrecompile>(
        &self,
        precompile: &P,
        caller: Address,
        input: &[u8],
    ) -> (CallResult, CallJournal) {
        self.call_with(precompile, self.frame(precompile, caller), input)
    }

    pub fn frame<P: BridgePrecompile>(&self, precompile: &P, caller: Address) -> CallFrame {
        CallFrame {
            caller,
            target: precompile.address(),
            value: U256::ZERO,
            gas: GAS_LIMIT,
            read_only: false,
        }
    }

    /// Runs the call and captures the journal it would have applied.
    pub fn call_with<P: BridgePrecompile>(
        &self,
        precompile: &P,
        frame: CallFrame,
        input: &[u8],
    ) -> (CallResult, CallJournal) {
        let mut captured = CallJournal::default();
        let result = execute(precompile, &mut self.ctx.lock(), &frame, input, |journal| {
            captured = journal.clone();
            Ok(())
        });
        (result, captured)
    }
}
