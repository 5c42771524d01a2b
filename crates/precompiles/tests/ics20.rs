mod common;

use alloy::sol_types::{SolCall, SolEvent, SolValue};
use alloy_primitives::{address, keccak256, Address, Bytes, Log, U256};
use bridge_ledger::{
    ibc::{
        escrow_address, Channel, ConnectionEnd, Counterparty, Denom, Hop, MemoryChannelKeeper,
        MemoryTransferKeeper, State, TransferKeeper,
    },
    LedgerError,
};
use bridge_precompiles::{
    abi::IICS20,
    journal::{BalanceChange, BalanceOp},
    BridgeError, PrecompileCallError, ICS20_PRECOMPILE_ADDR,
};
use common::{CallResult, Harness, EVM_DENOM, OWNER, SPENDER};

const PORT: &str = "transfer";
const CHANNEL: &str = "channel-0";
const CONNECTION: &str = "connection-0";
const RECEIVER: &str = "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu";
/// Contract that forwards user calls to the precompile.
const ROUTER: Address = address!("0x00000000000000000000000000000000000000e1");

fn open_channel(harness: &Harness, channel_state: State, connection: Option<State>) {
    let mut ctx = harness.ctx.lock();
    let channel = Channel {
        state: channel_state,
        counterparty: Counterparty { port_id: PORT.into(), channel_id: "channel-7".into() },
        connection_hops: vec![CONNECTION.into()],
        version: "ics20-1".into(),
    };
    MemoryChannelKeeper.set_channel(&mut ctx, PORT, CHANNEL, &channel).unwrap();
    if let Some(state) = connection {
        let end = ConnectionEnd { client_id: "07-tendermint-0".into(), state };
        MemoryChannelKeeper.set_connection(&mut ctx, CONNECTION, &end).unwrap();
    }
}

fn transfer_call(channel: &str, denom: &str, amount: u64, sender: Address) -> IICS20::transferCall {
    let v1 = channel.starts_with("channel-");
    IICS20::transferCall {
        sourcePort: PORT.into(),
        sourceChannel: channel.into(),
        denom: denom.into(),
        amount: U256::from(amount),
        sender,
        receiver: RECEIVER.into(),
        timeoutHeight: if v1 {
            IICS20::Height { revisionNumber: 1, revisionHeight: 1_000 }
        } else {
            IICS20::Height { revisionNumber: 0, revisionHeight: 0 }
        },
        timeoutTimestamp: if v1 { 0 } else { 1_700_000_000_000_000_000 },
        memo: String::new(),
    }
}

fn ledger_revert(result: CallResult) -> LedgerError {
    match result {
        Err(PrecompileCallError::Revert(BridgeError::Ledger(err))) => err,
        other => panic!("expected ledger revert, got {other:?}"),
    }
}

fn sequence(harness: &Harness) -> u64 {
    MemoryTransferKeeper::new(harness.bank.clone())
        .next_sequence_send(&mut harness.ctx.lock(), PORT, CHANNEL)
        .unwrap()
}

// === Test: transfer ===

#[test]
fn native_transfer_escrows_and_reports_sequence() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    harness.mint(OWNER, EVM_DENOM, 1_000);
    open_channel(&harness, State::Open, Some(State::Open));

    let call = transfer_call(CHANNEL, EVM_DENOM, 250, OWNER);
    let (result, journal) = harness.call(&ics20, OWNER, &call.abi_encode());
    let outcome = result.expect("transfer succeeds");
    assert_eq!(u64::abi_decode(&outcome.output).unwrap(), 1);
    assert_eq!(sequence(&harness), 2);

    let escrow = escrow_address(PORT, CHANNEL);
    assert_eq!(harness.balance(OWNER, EVM_DENOM), U256::from(750u64));
    assert_eq!(harness.balance(escrow, EVM_DENOM), U256::from(250u64));
    assert_eq!(
        journal.balance_changes(),
        &[
            BalanceChange { account: OWNER, amount: U256::from(250u64), op: BalanceOp::Sub },
            BalanceChange { account: escrow, amount: U256::from(250u64), op: BalanceOp::Add },
        ]
    );

    let expected = IICS20::IBCTransfer {
        sender: OWNER,
        receiver: keccak256(RECEIVER.as_bytes()),
        sourcePort: PORT.into(),
        sourceChannel: CHANNEL.into(),
        denom: EVM_DENOM.into(),
        amount: U256::from(250u64),
        memo: String::new(),
    };
    assert_eq!(
        journal.logs(),
        &[Log { address: ICS20_PRECOMPILE_ADDR, data: expected.encode_log_data() }]
    );

    let (result, _) = harness.call(&ics20, OWNER, &call.abi_encode());
    assert_eq!(u64::abi_decode(&result.unwrap().output).unwrap(), 2);
}

#[test]
fn ledger_gas_is_charged_on_top_of_the_static_cost() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    harness.mint(OWNER, EVM_DENOM, 10);
    open_channel(&harness, State::Open, Some(State::Open));

    let input = transfer_call(CHANNEL, EVM_DENOM, 1, OWNER).abi_encode();
    let (result, _) = harness.call(&ics20, OWNER, &input);
    // arguments only, the selector is free
    let static_cost = 2_000 + 30 * (input.len() - 4) as u64;
    assert!(result.unwrap().gas_used > static_cost);
}

#[test]
fn voucher_returning_home_is_burned_without_balance_mirror() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    let trace = Denom::new("uatom", vec![Hop::new(PORT, CHANNEL)]);
    MemoryTransferKeeper::new(harness.bank.clone())
        .set_denom(&mut harness.ctx.lock(), &trace)
        .unwrap();
    let voucher = trace.ibc_denom();
    harness.mint(OWNER, &voucher, 40);
    open_channel(&harness, State::Open, Some(State::Open));

    let call = transfer_call(CHANNEL, &voucher, 40, OWNER);
    let (result, journal) = harness.call(&ics20, OWNER, &call.abi_encode());
    assert!(result.is_ok());
    assert_eq!(harness.balance(OWNER, &voucher), U256::ZERO);
    assert_eq!(harness.balance(escrow_address(PORT, CHANNEL), &voucher), U256::ZERO);
    assert!(journal.balance_changes().is_empty());
    assert_eq!(journal.logs().len(), 1);
}

#[test]
fn sender_must_be_the_caller() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    harness.mint(OWNER, EVM_DENOM, 100);
    open_channel(&harness, State::Open, Some(State::Open));

    let call = transfer_call(CHANNEL, EVM_DENOM, 10, OWNER);
    let (result, journal) = harness.call(&ics20, SPENDER, &call.abi_encode());
    let err = result.unwrap_err();
    assert_eq!(
        err,
        PrecompileCallError::Revert(BridgeError::RequesterIsNotMsgSender {
            caller: SPENDER,
            sender: OWNER
        })
    );
    assert!(err.to_string().starts_with("requester address"));
    assert!(journal.logs().is_empty());
    assert_eq!(harness.balance(OWNER, EVM_DENOM), U256::from(100u64));
    assert_eq!(sequence(&harness), 1);
}

#[test]
fn contract_cannot_send_on_behalf_of_another_account() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    harness.mint(OWNER, EVM_DENOM, 100);
    harness.mint(ROUTER, EVM_DENOM, 100);
    open_channel(&harness, State::Open, Some(State::Open));

    // a router contract calling through with the end user named as sender
    let call = transfer_call(CHANNEL, EVM_DENOM, 10, OWNER);
    let (result, journal) = harness.call(&ics20, ROUTER, &call.abi_encode());
    assert_eq!(
        result.unwrap_err(),
        PrecompileCallError::Revert(BridgeError::RequesterIsNotMsgSender {
            caller: ROUTER,
            sender: OWNER
        })
    );
    assert!(journal.balance_changes().is_empty());
    assert_eq!(harness.balance(OWNER, EVM_DENOM), U256::from(100u64));

    // the same contract may move its own funds
    let call = transfer_call(CHANNEL, EVM_DENOM, 10, ROUTER);
    let (result, _) = harness.call(&ics20, ROUTER, &call.abi_encode());
    assert!(result.is_ok());
    assert_eq!(harness.balance(ROUTER, EVM_DENOM), U256::from(90u64));
}

#[test]
fn channel_gating_errors_are_distinct() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    harness.mint(OWNER, EVM_DENOM, 100);
    let input = transfer_call(CHANNEL, EVM_DENOM, 10, OWNER).abi_encode();

    let err = ledger_revert(harness.call(&ics20, OWNER, &input).0);
    assert!(matches!(err, LedgerError::ChannelNotFound { .. }));

    open_channel(&harness, State::Open, None);
    let err = ledger_revert(harness.call(&ics20, OWNER, &input).0);
    assert_eq!(err, LedgerError::ConnectionNotFound(CONNECTION.into()));

    open_channel(&harness, State::Open, Some(State::Init));
    let err = ledger_revert(harness.call(&ics20, OWNER, &input).0);
    assert!(matches!(err, LedgerError::ConnectionNotOpen { .. }));

    open_channel(&harness, State::Closed, Some(State::Open));
    let err = ledger_revert(harness.call(&ics20, OWNER, &input).0);
    assert!(matches!(
        err,
        LedgerError::ChannelNotOpen { ref state, .. } if state == "STATE_CLOSED"
    ));

    assert_eq!(harness.balance(OWNER, EVM_DENOM), U256::from(100u64));
    assert_eq!(sequence(&harness), 1);
}

#[test]
fn client_identifier_routes_without_channel_lookup() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    harness.mint(OWNER, EVM_DENOM, 100);

    let call = transfer_call("07-tendermint-0", EVM_DENOM, 10, OWNER);
    let (result, journal) = harness.call(&ics20, OWNER, &call.abi_encode());
    assert_eq!(u64::abi_decode(&result.unwrap().output).unwrap(), 1);
    assert_eq!(journal.balance_changes()[1].account, escrow_address(PORT, "07-tendermint-0"));
}

#[test]
fn malformed_client_identifier_writes_nothing() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    harness.mint(OWNER, EVM_DENOM, 100);

    let call = transfer_call("client-1", EVM_DENOM, 10, OWNER);
    let (result, journal) = harness.call(&ics20, OWNER, &call.abi_encode());
    assert_eq!(ledger_revert(result), LedgerError::InvalidChannel("client-1".into()));
    assert!(journal.logs().is_empty());
    assert!(harness.ctx.lock().store().prefix_entries(b"transfer/").is_empty());
}

#[test]
fn invalid_message_fails_before_channel_checks() {
    let harness = Harness::new();
    let ics20 = harness.ics20();

    let mut call = transfer_call(CHANNEL, EVM_DENOM, 10, OWNER);
    call.timeoutHeight = IICS20::Height { revisionNumber: 0, revisionHeight: 0 };
    let err = ledger_revert(harness.call(&ics20, OWNER, &call.abi_encode()).0);
    assert!(matches!(err, LedgerError::InvalidTransfer(_)));

    let zero = transfer_call(CHANNEL, EVM_DENOM, 0, OWNER);
    let err = ledger_revert(harness.call(&ics20, OWNER, &zero.abi_encode()).0);
    assert!(matches!(err, LedgerError::InvalidCoins(_)));
}

#[test]
fn read_only_frame_rejects_transfer() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    let mut frame = harness.frame(&ics20, OWNER);
    frame.read_only = true;

    let input = transfer_call(CHANNEL, EVM_DENOM, 10, OWNER).abi_encode();
    let (result, _) = harness.call_with(&ics20, frame, &input);
    assert_eq!(result.unwrap_err(), PrecompileCallError::Revert(BridgeError::WriteProtection));
}

// === Test: queries ===

fn store_traces(harness: &Harness) -> Vec<Denom> {
    let keeper = MemoryTransferKeeper::new(harness.bank.clone());
    let traces = vec![
        Denom::new("uatom", vec![Hop::new(PORT, CHANNEL)]),
        Denom::new("uosmo", vec![Hop::new(PORT, "channel-3"), Hop::new(PORT, CHANNEL)]),
    ];
    for trace in &traces {
        keeper.set_denom(&mut harness.ctx.lock(), trace).unwrap();
    }
    traces
}

#[test]
fn denom_lookup_and_missing_sentinel() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    let traces = store_traces(&harness);

    let hash = traces[0].ibc_denom().trim_start_matches("ibc/").to_string();
    let input = IICS20::denomCall { hash }.abi_encode();
    let output = harness.call(&ics20, OWNER, &input).0.unwrap().output;
    let denom = IICS20::Denom::abi_decode(&output).unwrap();
    assert_eq!(denom.base, "uatom");
    assert_eq!(denom.trace, vec![IICS20::Hop { portId: PORT.into(), channelId: CHANNEL.into() }]);

    let unknown = IICS20::denomCall { hash: hex::encode([7u8; 32]) }.abi_encode();
    let output = harness.call(&ics20, OWNER, &unknown).0.unwrap().output;
    let denom = IICS20::Denom::abi_decode(&output).unwrap();
    assert!(denom.base.is_empty());
    assert!(denom.trace.is_empty());

    let malformed = IICS20::denomCall { hash: "zz".into() }.abi_encode();
    let err = ledger_revert(harness.call(&ics20, OWNER, &malformed).0);
    assert!(matches!(err, LedgerError::InvalidDenomHash(_)));
}

#[test]
fn denom_hash_lookup_and_missing_sentinel() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    let traces = store_traces(&harness);

    let input = IICS20::denomHashCall { trace: traces[1].path() }.abi_encode();
    let output = harness.call(&ics20, OWNER, &input).0.unwrap().output;
    assert_eq!(String::abi_decode(&output).unwrap(), hex::encode_upper(traces[1].hash()));

    let input = IICS20::denomHashCall { trace: "transfer/channel-9/uatom".into() }.abi_encode();
    let output = harness.call(&ics20, OWNER, &input).0.unwrap().output;
    assert_eq!(String::abi_decode(&output).unwrap(), "");

    let input = IICS20::denomHashCall { trace: "transfer/".into() }.abi_encode();
    let err = ledger_revert(harness.call(&ics20, OWNER, &input).0);
    assert!(matches!(err, LedgerError::InvalidDenomTrace(_)));
}

#[test]
fn denoms_are_paginated() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    store_traces(&harness);

    let page = IICS20::PageRequest {
        key: Bytes::new(),
        offset: 0,
        limit: 1,
        countTotal: true,
        reverse: false,
    };
    let input = IICS20::denomsCall { pageRequest: page }.abi_encode();
    let output = harness.call(&ics20, OWNER, &input).0.unwrap().output;
    let (denoms, response) =
        <(Vec<IICS20::Denom>, IICS20::PageResponse)>::abi_decode_params(&output).unwrap();
    assert_eq!(denoms.len(), 1);
    assert_eq!(response.total, 2);
    assert!(!response.nextKey.is_empty());

    let next = IICS20::PageRequest {
        key: response.nextKey,
        offset: 0,
        limit: 1,
        countTotal: false,
        reverse: false,
    };
    let input = IICS20::denomsCall { pageRequest: next }.abi_encode();
    let output = harness.call(&ics20, OWNER, &input).0.unwrap().output;
    let (rest, response) =
        <(Vec<IICS20::Denom>, IICS20::PageResponse)>::abi_decode_params(&output).unwrap();
    assert_eq!(rest.len(), 1);
    assert_ne!(rest[0], denoms[0]);
    assert!(response.nextKey.is_empty());
}

#[test]
fn unknown_selector_is_a_decode_error() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    let (result, _) = harness.call(&ics20, OWNER, &[0xde, 0xad, 0xbe, 0xef]);
    assert!(matches!(result, Err(PrecompileCallError::Decode(_))));
}

#[test]
fn keeper_and_precompile_agree_on_sequence() {
    let harness = Harness::new();
    let ics20 = harness.ics20();
    harness.mint(OWNER, EVM_DENOM, 100);
    open_channel(&harness, State::Open, Some(State::Open));

    let keeper = MemoryTransferKeeper::new(harness.bank.clone());
    let msg = bridge_precompiles::ics20::msg_transfer_from_call(
        &transfer_call(CHANNEL, EVM_DENOM, 5, OWNER),
        &harness.config.bech32_prefix,
    )
    .unwrap();
    let direct = keeper.transfer(&mut harness.ctx.lock(), &msg).unwrap();
    assert_eq!(direct.sequence, 1);

    let input = transfer_call(CHANNEL, EVM_DENOM, 5, OWNER).abi_encode();
    let output = harness.call(&ics20, OWNER, &input).0.unwrap().output;
    assert_eq!(u64::abi_decode(&output).unwrap(), 2);
    assert_eq!(keeper.total_escrow(&mut harness.ctx.lock(), EVM_DENOM).unwrap(), U256::from(10u64));
}
