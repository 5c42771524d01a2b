//! Calls routed through the registry and the EVM journal.

mod common;

use alloy::sol_types::{SolCall, SolEvent};
use alloy_evm::{
    precompiles::PrecompileInput,
    revm::precompile::{PrecompileError, PrecompileResult},
    EvmInternals,
};
use alloy_primitives::{Address, U256};
use bridge_ledger::{Erc20Keeper, Owner, TokenPair};
use bridge_precompiles::{
    abi::{IERC20, IWERC20},
    PrecompileRegistry, LEDGER_CHECKPOINT_ADDR, LEDGER_CHECKPOINT_SLOT,
};
use common::{Harness, EVM_DENOM, GAS_LIMIT, NATIVE_TOKEN, OWNER, RECEIVER, SPENDER};
use revm::{
    context::{
        journal::{Journal, JournalInner},
        BlockEnv, CfgEnv, TxEnv,
    },
    database::{CacheDB, EmptyDB},
    primitives::hardfork::SpecId,
};

type TestJournal = Journal<CacheDB<EmptyDB>>;

/// Journal plus the environment `EvmInternals` borrows.
struct TestEvm {
    journal: TestJournal,
    block_env: BlockEnv,
    cfg: CfgEnv,
    tx: TxEnv,
}

impl TestEvm {
    fn new() -> Self {
        let mut journal = Journal::new_with_inner(CacheDB::default(), JournalInner::new());
        journal.inner.set_spec_id(SpecId::PRAGUE);
        Self {
            journal,
            block_env: BlockEnv::default(),
            cfg: CfgEnv::default(),
            tx: TxEnv::default(),
        }
    }

    fn internals(&mut self) -> EvmInternals<'_> {
        EvmInternals::new(&mut self.journal, &self.block_env, &self.cfg, &self.tx)
    }

    fn seed_balance(&mut self, address: Address, amount: U256) {
        let mut internals = self.internals();
        internals.load_account(address).unwrap();
        internals.set_balance(address, amount).unwrap();
        internals.touch_account(address).unwrap();
    }

    fn balance(&self, address: Address) -> Option<U256> {
        self.journal.inner.state.get(&address).map(|account| account.info.balance)
    }

    fn checkpoint_counter(&mut self) -> u64 {
        let slot = self.internals().sload(LEDGER_CHECKPOINT_ADDR, LEDGER_CHECKPOINT_SLOT).unwrap();
        slot.data.to::<u64>()
    }

    fn call(
        &mut self,
        registry: &PrecompileRegistry,
        caller: Address,
        data: &[u8],
        value: U256,
        is_static: bool,
    ) -> PrecompileResult {
        let entry = registry.get(&NATIVE_TOKEN).expect("native pair registered");
        let input = PrecompileInput {
            data,
            gas: GAS_LIMIT,
            caller,
            value,
            target_address: NATIVE_TOKEN,
            is_static,
            bytecode_address: NATIVE_TOKEN,
            internals: self.internals(),
        };
        entry.call(input)
    }

    fn run_call(
        &mut self,
        registry: &PrecompileRegistry,
        caller: Address,
        data: &[u8],
    ) -> PrecompileResult {
        self.call(registry, caller, data, U256::ZERO, false)
    }
}

fn registry(harness: &Harness) -> PrecompileRegistry {
    PrecompileRegistry::new(harness.config.clone(), harness.keepers.clone(), harness.ctx.clone())
        .unwrap()
}

fn register_native(harness: &Harness) {
    let pair = TokenPair::new(NATIVE_TOKEN, EVM_DENOM, Owner::Module);
    Erc20Keeper.register_token_pair(&mut harness.ctx.lock(), &pair).unwrap();
}

fn transfer(to: Address, amount: u64) -> Vec<u8> {
    IERC20::transferCall { to, amount: U256::from(amount) }.abi_encode()
}

/// Native pair funded with `amount` on both the ledger and the EVM side.
fn funded(amount: u64) -> (Harness, PrecompileRegistry, TestEvm) {
    let harness = Harness::new();
    register_native(&harness);
    harness.mint(OWNER, EVM_DENOM, amount);
    let registry = registry(&harness);
    let mut evm = TestEvm::new();
    evm.seed_balance(OWNER, U256::from(amount));
    (harness, registry, evm)
}

#[test]
fn native_transfer_mirrors_balances_and_logs() {
    let (harness, registry, mut evm) = funded(100);

    let output = evm.run_call(&registry, OWNER, &transfer(RECEIVER, 30)).unwrap();
    assert_eq!(output.gas_used, 9_000);

    assert_eq!(evm.balance(OWNER), Some(U256::from(70u64)));
    assert_eq!(evm.balance(RECEIVER), Some(U256::from(30u64)));
    assert_eq!(harness.balance(RECEIVER, EVM_DENOM), U256::from(30u64));

    let logs = &evm.journal.inner.logs;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].address, NATIVE_TOKEN);
    let event = IERC20::Transfer::decode_log_data(&logs[0].data).unwrap();
    assert_eq!((event.from, event.to, event.value), (OWNER, RECEIVER, U256::from(30u64)));
}

#[test]
fn reverted_call_leaves_journal_untouched() {
    let (harness, registry, mut evm) = funded(10);

    let calldata =
        IERC20::transferFromCall { from: OWNER, to: RECEIVER, amount: U256::from(5u64) }
            .abi_encode();
    let err = evm.run_call(&registry, SPENDER, &calldata).unwrap_err();
    match err {
        PrecompileError::Other(msg) => assert_eq!(msg, "ERC20: insufficient allowance"),
        other => panic!("expected revert, got {other:?}"),
    }

    assert_eq!(evm.balance(OWNER), Some(U256::from(10u64)));
    assert!(evm.journal.inner.logs.is_empty());
    assert_eq!(harness.balance(OWNER, EVM_DENOM), U256::from(10u64));
    assert_eq!(harness.ctx.lock().pending_len(), 0);
}

#[test]
fn evm_balance_shortfall_discards_ledger_writes() {
    let harness = Harness::new();
    register_native(&harness);
    harness.mint(OWNER, EVM_DENOM, 50);
    let registry = registry(&harness);

    // ledger and EVM views disagree: the EVM account holds nothing
    let mut evm = TestEvm::new();
    let err = evm.run_call(&registry, OWNER, &transfer(RECEIVER, 20)).unwrap_err();
    assert!(matches!(err, PrecompileError::Other(msg) if msg.starts_with("evm state")));

    assert_eq!(harness.balance(OWNER, EVM_DENOM), U256::from(50u64));
    assert_eq!(harness.balance(RECEIVER, EVM_DENOM), U256::ZERO);
    assert_eq!(evm.checkpoint_counter(), 0);
}

#[test]
fn block_number_reaches_ledger_header() {
    let harness = Harness::new();
    register_native(&harness);
    let registry = registry(&harness);

    let mut evm = TestEvm::new();
    evm.block_env.number = U256::from(42u64);
    let calldata = IERC20::totalSupplyCall {}.abi_encode();
    evm.run_call(&registry, OWNER, &calldata).unwrap();

    assert_eq!(harness.ctx.lock().block_height(), 42);
}

#[test]
fn value_bearing_call_is_refused() {
    let harness = Harness::new();
    register_native(&harness);
    let registry = registry(&harness);

    let mut evm = TestEvm::new();
    let calldata = IERC20::totalSupplyCall {}.abi_encode();
    let err = evm.call(&registry, OWNER, &calldata, U256::from(1u64), false).unwrap_err();
    assert!(matches!(
        err,
        PrecompileError::Other(msg) if msg == "cannot receive funds, received: 1"
    ));
}

// === Test: frame atomicity ===

#[test]
fn outer_revert_rolls_back_ledger_writes() {
    let (harness, registry, mut evm) = funded(100);

    let checkpoint = evm.journal.inner.checkpoint();
    evm.run_call(&registry, OWNER, &transfer(RECEIVER, 30)).unwrap();
    assert_eq!(harness.balance(RECEIVER, EVM_DENOM), U256::from(30u64));
    assert_eq!(evm.checkpoint_counter(), 1);
    evm.journal.inner.checkpoint_revert(checkpoint);

    registry.reconcile(&mut evm.internals()).unwrap();
    assert_eq!(evm.balance(OWNER), Some(U256::from(100u64)));
    assert_eq!(harness.balance(OWNER, EVM_DENOM), U256::from(100u64));
    assert_eq!(harness.balance(RECEIVER, EVM_DENOM), U256::ZERO);
    assert_eq!(harness.ctx.lock().pending_len(), 0);
    assert!(evm.journal.inner.logs.is_empty());

    // the next call starts from the restored balances
    evm.run_call(&registry, OWNER, &transfer(RECEIVER, 10)).unwrap();
    assert_eq!(harness.balance(OWNER, EVM_DENOM), U256::from(90u64));
    assert_eq!(evm.balance(RECEIVER), Some(U256::from(10u64)));
}

#[test]
fn inner_revert_keeps_earlier_writes() {
    let (harness, registry, mut evm) = funded(100);

    evm.run_call(&registry, OWNER, &transfer(RECEIVER, 10)).unwrap();
    let checkpoint = evm.journal.inner.checkpoint();
    evm.run_call(&registry, OWNER, &transfer(RECEIVER, 20)).unwrap();
    assert_eq!(harness.ctx.lock().pending_len(), 2);
    evm.journal.inner.checkpoint_revert(checkpoint);

    // any later call reconciles before it reads
    let calldata = IERC20::balanceOfCall { account: RECEIVER }.abi_encode();
    let output = evm.run_call(&registry, OWNER, &calldata).unwrap();
    assert_eq!(U256::from_be_slice(&output.bytes), U256::from(10u64));
    assert_eq!(harness.ctx.lock().pending_len(), 1);
    assert_eq!(harness.balance(OWNER, EVM_DENOM), U256::from(90u64));
    assert_eq!(evm.balance(RECEIVER), Some(U256::from(10u64)));
}

#[test]
fn committed_writes_settle_into_ledger_state() {
    let (harness, registry, mut evm) = funded(100);

    let _checkpoint = evm.journal.inner.checkpoint();
    evm.run_call(&registry, OWNER, &transfer(RECEIVER, 30)).unwrap();
    evm.journal.inner.checkpoint_commit();

    let live = evm.checkpoint_counter();
    assert_eq!(live, 1);
    registry.settle(live).unwrap();

    let ctx = harness.ctx.lock();
    assert_eq!(ctx.pending_len(), 0);
    assert_eq!(ctx.store().depth(), 0);
    drop(ctx);
    assert_eq!(harness.balance(RECEIVER, EVM_DENOM), U256::from(30u64));
}

#[test]
fn queries_leave_no_pending_write() {
    let (harness, registry, mut evm) = funded(5);

    let calldata = IERC20::balanceOfCall { account: OWNER }.abi_encode();
    evm.run_call(&registry, OWNER, &calldata).unwrap();
    assert_eq!(harness.ctx.lock().pending_len(), 0);
    assert_eq!(evm.checkpoint_counter(), 0);
}

// === Test: static frames ===

#[test]
fn static_call_refuses_state_changes() {
    let (harness, registry, mut evm) = funded(100);

    let calldata = transfer(RECEIVER, 30);
    let err = evm.call(&registry, OWNER, &calldata, U256::ZERO, true).unwrap_err();
    assert!(matches!(err, PrecompileError::Other(msg) if msg == "write protection"));
    assert_eq!(harness.balance(RECEIVER, EVM_DENOM), U256::ZERO);
    assert_eq!(evm.balance(OWNER), Some(U256::from(100u64)));

    let approve = IERC20::approveCall { spender: SPENDER, amount: U256::from(1u64) }.abi_encode();
    let err = evm.call(&registry, OWNER, &approve, U256::ZERO, true).unwrap_err();
    assert!(matches!(err, PrecompileError::Other(msg) if msg == "write protection"));

    let calldata = IERC20::balanceOfCall { account: OWNER }.abi_encode();
    assert!(evm.call(&registry, OWNER, &calldata, U256::ZERO, true).is_ok());
}

// === Test: wrapped native coin ===

#[test]
fn deposit_returns_value_to_the_caller() {
    let (harness, registry, mut evm) = funded(0);
    // the EVM has already moved the value into the precompile account
    evm.seed_balance(NATIVE_TOKEN, U256::from(5u64));

    let calldata = IWERC20::depositCall {}.abi_encode();
    let output = evm.call(&registry, OWNER, &calldata, U256::from(5u64), false).unwrap();
    assert_eq!(output.gas_used, 23_878);
    assert!(output.bytes.is_empty());

    assert_eq!(evm.balance(OWNER), Some(U256::from(5u64)));
    assert_eq!(evm.balance(NATIVE_TOKEN), Some(U256::ZERO));
    assert_eq!(harness.ctx.lock().pending_len(), 0);

    let logs = &evm.journal.inner.logs;
    assert_eq!(logs.len(), 1);
    let event = IWERC20::Deposit::decode_log_data(&logs[0].data).unwrap();
    assert_eq!((event.dst, event.wad), (OWNER, U256::from(5u64)));
}

#[test]
fn plain_value_transfer_deposits() {
    let (_harness, registry, mut evm) = funded(0);
    evm.seed_balance(NATIVE_TOKEN, U256::from(2u64));

    evm.call(&registry, OWNER, &[], U256::from(2u64), false).unwrap();
    assert_eq!(evm.balance(OWNER), Some(U256::from(2u64)));
    let event = IWERC20::Deposit::decode_log_data(&evm.journal.inner.logs[0].data).unwrap();
    assert_eq!(event.wad, U256::from(2u64));
}
