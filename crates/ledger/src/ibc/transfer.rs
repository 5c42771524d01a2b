//! ICS-20 transfer messages and the transfer keeper.

use super::{
    denom::{parse_hex_hash, voucher_hash, Denom},
    host::{is_channel_id_format, validate_channel_identifier, validate_port_identifier},
    ICS20_VERSION,
};
use crate::{
    address::from_bech32,
    bank::BankKeeper,
    coin::{validate_denom, Coin},
    context::Context,
    error::LedgerError,
    events::Event,
};
use alloy_primitives::{Address, U256};
use core::fmt;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

/// Longest receiver accepted by `validate_basic`.
pub const MAX_RECEIVER_LEN: usize = 2048;
/// Longest memo accepted by `validate_basic`.
pub const MAX_MEMO_LEN: usize = 32768;
/// Page size used when a request leaves `limit` at zero.
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Event emitted for every accepted transfer.
pub const EVENT_TYPE_TRANSFER: &str = "ibc_transfer";

const DENOMS_PREFIX: &[u8] = b"transfer/denoms/";
const ESCROW_TOTAL_PREFIX: &[u8] = b"transfer/totalEscrow/";
const NEXT_SEQUENCE_PREFIX: &str = "transfer/nextSequenceSend";
const COMMITMENT_PREFIX: &str = "transfer/commitments";

/// Timeout height on the destination chain; zero disables it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Height {
    pub revision_number: u64,
    pub revision_height: u64,
}

impl Height {
    pub const fn new(revision_number: u64, revision_height: u64) -> Self {
        Self { revision_number, revision_height }
    }

    pub const fn is_zero(&self) -> bool {
        self.revision_number == 0 && self.revision_height == 0
    }
}

/// Outbound fungible token transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgTransfer {
    pub source_port: String,
    pub source_channel: String,
    pub token: Coin,
    /// Bech32 sender address.
    pub sender: String,
    pub receiver: String,
    pub timeout_height: Height,
    /// Absolute timeout in nanoseconds since the Unix epoch; zero disables it.
    pub timeout_timestamp: u64,
    pub memo: String,
}

impl MsgTransfer {
    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        validate_port_identifier(&self.source_port)?;
        validate_channel_identifier(&self.source_channel)?;
        self.token.validate()?;
        if !self.token.is_positive() {
            return Err(LedgerError::InvalidCoins(self.token.to_string()));
        }
        if let Some(hash) = self.token.denom.strip_prefix("ibc/") {
            parse_hex_hash(hash)?;
        } else {
            validate_denom(&self.token.denom)?;
        }
        from_bech32(&self.sender)?;
        if self.receiver.trim().is_empty() {
            return Err(LedgerError::InvalidAddress("missing recipient address".to_string()));
        }
        if self.receiver.len() > MAX_RECEIVER_LEN {
            return Err(LedgerError::InvalidAddress(format!(
                "recipient address must not exceed {MAX_RECEIVER_LEN} bytes"
            )));
        }
        if self.memo.len() > MAX_MEMO_LEN {
            return Err(LedgerError::InvalidTransfer(format!(
                "memo must not exceed {MAX_MEMO_LEN} bytes"
            )));
        }
        if self.timeout_height.is_zero() && self.timeout_timestamp == 0 {
            return Err(LedgerError::InvalidTransfer(
                "timeout height and timeout timestamp cannot both be 0".to_string(),
            ));
        }
        if !is_channel_id_format(&self.source_channel) && !self.timeout_height.is_zero() {
            return Err(LedgerError::InvalidTransfer(
                "timeout height must be zero for IBC v2 transfers".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MsgTransferResponse {
    /// Packet sequence the transfer was sent with.
    pub sequence: u64,
}

/// Cursor pagination over a prefix store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub key: Vec<u8>,
    pub offset: u64,
    pub limit: u64,
    pub count_total: bool,
    pub reverse: bool,
}

/// Pagination state returned with a page.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PageResponse {
    /// Key to resume from; empty when there are no more results.
    pub next_key: Vec<u8>,
    /// Total entries, filled only when `count_total` was requested with an offset page.
    pub total: u64,
}

/// Packet data committed for a sent transfer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FungibleTokenPacketData {
    pub denom: String,
    pub amount: String,
    pub sender: String,
    pub receiver: String,
    pub memo: String,
}

/// Outbound transfers and denomination trace queries.
pub trait TransferKeeper: Send + Sync + fmt::Debug {
    fn transfer(
        &self,
        ctx: &mut Context,
        msg: &MsgTransfer,
    ) -> Result<MsgTransferResponse, LedgerError>;

    /// Trace for a hex-encoded denom hash; `DenomNotFound` when unknown.
    fn denom(&self, ctx: &mut Context, hash: &str) -> Result<Denom, LedgerError>;

    fn denoms(
        &self,
        ctx: &mut Context,
        page: &PageRequest,
    ) -> Result<(Vec<Denom>, PageResponse), LedgerError>;

    /// Hex hash of a full denomination path; `DenomNotFound` when the trace is unknown.
    fn denom_hash(&self, ctx: &mut Context, trace: &str) -> Result<String, LedgerError>;
}

/// Escrow account for native coins sent over `port_id/channel_id`.
pub fn escrow_address(port_id: &str, channel_id: &str) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(ICS20_VERSION.as_bytes());
    hasher.update([0u8]);
    hasher.update(format!("{port_id}/{channel_id}").as_bytes());
    Address::from_slice(&hasher.finalize()[..20])
}

/// Transfer keeper backed by the context store and a bank keeper.
#[derive(Clone, Debug)]
pub struct MemoryTransferKeeper<B> {
    bank: B,
}

impl<B: BankKeeper> MemoryTransferKeeper<B> {
    pub const fn new(bank: B) -> Self {
        Self { bank }
    }

    /// Records a denomination trace so vouchers can be resolved.
    pub fn set_denom(&self, ctx: &mut Context, denom: &Denom) -> Result<(), LedgerError> {
        ctx.set_json(denom_key(&denom.hash().0), denom)
    }

    pub fn total_escrow(&self, ctx: &mut Context, denom: &str) -> Result<U256, LedgerError> {
        Ok(ctx.get_u256(&[ESCROW_TOTAL_PREFIX, denom.as_bytes()].concat())?.unwrap_or_default())
    }

    /// Sequence the next packet on `port_id/channel_id` will carry.
    pub fn next_sequence_send(
        &self,
        ctx: &mut Context,
        port_id: &str,
        channel_id: &str,
    ) -> Result<u64, LedgerError> {
        Ok(ctx.get_json(&sequence_key(port_id, channel_id))?.unwrap_or(1))
    }

    fn resolve_denom(&self, ctx: &mut Context, bank_denom: &str) -> Result<Denom, LedgerError> {
        if !bank_denom.starts_with("ibc/") {
            return Ok(Denom::native(bank_denom));
        }
        let hash = voucher_hash(bank_denom)?;
        ctx.get_json(&denom_key(&hash.0))?.ok_or(LedgerError::DenomNotFound)
    }
}

impl<B: BankKeeper> TransferKeeper for MemoryTransferKeeper<B> {
    fn transfer(
        &self,
        ctx: &mut Context,
        msg: &MsgTransfer,
    ) -> Result<MsgTransferResponse, LedgerError> {
        msg.validate_basic()?;
        let (_, sender) = from_bech32(&msg.sender)?;
        let amount = msg.token.amount_u256()?;
        if !self.bank.is_send_enabled(ctx, &msg.token.denom)? {
            return Err(LedgerError::SendDisabled(msg.token.denom.clone()));
        }

        let denom = self.resolve_denom(ctx, &msg.token.denom)?;
        if denom.has_prefix(&msg.source_port, &msg.source_channel) {
            // voucher returning over its origin hop
            self.bank.burn_coins(ctx, sender, &msg.token)?;
        } else {
            let escrow = escrow_address(&msg.source_port, &msg.source_channel);
            self.bank.send_coins(ctx, sender, escrow, &msg.token)?;
            let total = self.total_escrow(ctx, &msg.token.denom)?;
            let total = total
                .checked_add(amount)
                .ok_or_else(|| LedgerError::InvalidCoins(msg.token.to_string()))?;
            ctx.set_u256([ESCROW_TOTAL_PREFIX, msg.token.denom.as_bytes()].concat(), total)?;
        }

        let sequence = self.next_sequence_send(ctx, &msg.source_port, &msg.source_channel)?;
        ctx.set_json(sequence_key(&msg.source_port, &msg.source_channel), &(sequence + 1))?;
        let packet = FungibleTokenPacketData {
            denom: denom.path(),
            amount: msg.token.amount.to_string(),
            sender: msg.sender.clone(),
            receiver: msg.receiver.clone(),
            memo: msg.memo.clone(),
        };
        ctx.set_json(
            format!("{COMMITMENT_PREFIX}/{}/{}/{sequence}", msg.source_port, msg.source_channel)
                .into_bytes(),
            &packet,
        )?;

        info!(
            target: "bridge_ledger",
            port = %msg.source_port,
            channel = %msg.source_channel,
            sequence,
            token = %msg.token,
            "ibc transfer sent"
        );
        ctx.emit_event(
            Event::new(EVENT_TYPE_TRANSFER)
                .with_attribute("sender", msg.sender.clone())
                .with_attribute("receiver", msg.receiver.clone())
                .with_attribute("denom", packet.denom)
                .with_attribute("amount", packet.amount)
                .with_attribute("memo", msg.memo.clone()),
        );
        Ok(MsgTransferResponse { sequence })
    }

    fn denom(&self, ctx: &mut Context, hash: &str) -> Result<Denom, LedgerError> {
        let hash = parse_hex_hash(hash.strip_prefix("ibc/").unwrap_or(hash))?;
        ctx.get_json(&denom_key(&hash.0))?.ok_or(LedgerError::DenomNotFound)
    }

    fn denoms(
        &self,
        ctx: &mut Context,
        page: &PageRequest,
    ) -> Result<(Vec<Denom>, PageResponse), LedgerError> {
        let mut entries = ctx.prefix_entries(DENOMS_PREFIX)?;
        if page.reverse {
            entries.reverse();
        }
        let limit = if page.limit == 0 { DEFAULT_PAGE_LIMIT } else { page.limit };
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);

        let start = if page.key.is_empty() {
            usize::try_from(page.offset).unwrap_or(usize::MAX).min(entries.len())
        } else {
            let cursor = [DENOMS_PREFIX, page.key.as_slice()].concat();
            entries
                .iter()
                .position(|(key, _)| {
                    if page.reverse {
                        *key <= cursor
                    } else {
                        *key >= cursor
                    }
                })
                .unwrap_or(entries.len())
        };

        let end = start.saturating_add(limit).min(entries.len());
        let denoms = entries[start..end]
            .iter()
            .map(|(_, bytes)| {
                serde_json::from_slice(bytes).map_err(|err| LedgerError::Codec(err.to_string()))
            })
            .collect::<Result<Vec<Denom>, _>>()?;
        let next_key = entries
            .get(end)
            .map(|(key, _)| key[DENOMS_PREFIX.len()..].to_vec())
            .unwrap_or_default();
        let total = if page.count_total && page.key.is_empty() { entries.len() as u64 } else { 0 };
        Ok((denoms, PageResponse { next_key, total }))
    }

    fn denom_hash(&self, ctx: &mut Context, trace: &str) -> Result<String, LedgerError> {
        let denom = Denom::from_path(trace)?;
        denom.validate()?;
        let hash = denom.hash();
        if !ctx.has(&denom_key(&hash.0))? {
            return Err(LedgerError::DenomNotFound);
        }
        Ok(hex::encode_upper(hash))
    }
}

fn denom_key(hash: &[u8; 32]) -> Vec<u8> {
    [DENOMS_PREFIX, hash.as_slice()].concat()
}

fn sequence_key(port_id: &str, channel_id: &str) -> Vec<u8> {
    format!("{NEXT_SEQUENCE_PREFIX}/{port_id}/{channel_id}").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{address::to_bech32, bank::MemoryBank, context::BlockHeader, ibc::denom::Hop};
    use alloy_primitives::address;

    const SENDER: Address = address!("0x00000000000000000000000000000000000000a1");

    fn msg(denom: &str, amount: u64) -> MsgTransfer {
        MsgTransfer {
            source_port: "transfer".into(),
            source_channel: "channel-0".into(),
            token: Coin::new(denom, amount),
            sender: to_bech32("cosmos", SENDER).unwrap(),
            receiver: "cosmos1receiver".into(),
            timeout_height: Height::default(),
            timeout_timestamp: 1_000,
            memo: String::new(),
        }
    }

    fn setup() -> (Context, MemoryBank, MemoryTransferKeeper<MemoryBank>) {
        let mut ctx = Context::new(BlockHeader::default());
        let bank = MemoryBank::new();
        bank.mint(&mut ctx, SENDER, "aevmos", U256::from(1_000u64)).unwrap();
        let keeper = MemoryTransferKeeper::new(bank.clone());
        (ctx, bank, keeper)
    }

    #[test]
    fn escrow_address_is_stable() {
        let a = escrow_address("transfer", "channel-0");
        assert_eq!(a, escrow_address("transfer", "channel-0"));
        assert_ne!(a, escrow_address("transfer", "channel-1"));
    }

    #[test]
    fn native_transfer_escrows_and_sequences() {
        let (mut ctx, bank, keeper) = setup();

        let first = keeper.transfer(&mut ctx, &msg("aevmos", 100)).unwrap();
        let second = keeper.transfer(&mut ctx, &msg("aevmos", 50)).unwrap();
        assert_eq!((first.sequence, second.sequence), (1, 2));

        let escrow = escrow_address("transfer", "channel-0");
        assert_eq!(bank.balance(&mut ctx, escrow, "aevmos").unwrap(), U256::from(150u64));
        assert_eq!(bank.balance(&mut ctx, SENDER, "aevmos").unwrap(), U256::from(850u64));
        assert_eq!(keeper.total_escrow(&mut ctx, "aevmos").unwrap(), U256::from(150u64));
        assert_eq!(keeper.next_sequence_send(&mut ctx, "transfer", "channel-0").unwrap(), 3);
    }

    #[test]
    fn returning_voucher_is_burned() {
        let (mut ctx, bank, keeper) = setup();
        let voucher = Denom::new("uatom", vec![Hop::new("transfer", "channel-0")]);
        keeper.set_denom(&mut ctx, &voucher).unwrap();
        bank.mint(&mut ctx, SENDER, &voucher.ibc_denom(), U256::from(10u64)).unwrap();

        keeper.transfer(&mut ctx, &msg(&voucher.ibc_denom(), 10)).unwrap();
        assert_eq!(bank.supply(&mut ctx, &voucher.ibc_denom()).unwrap(), U256::ZERO);
    }

    #[test]
    fn validate_basic_rejects_bad_messages() {
        let mut zero = msg("aevmos", 0);
        assert!(matches!(zero.validate_basic(), Err(LedgerError::InvalidCoins(_))));

        zero = msg("aevmos", 1);
        zero.timeout_timestamp = 0;
        assert!(matches!(zero.validate_basic(), Err(LedgerError::InvalidTransfer(_))));

        let mut v2 = msg("aevmos", 1);
        v2.source_channel = "07-tendermint-0".into();
        v2.timeout_height = Height::new(1, 10);
        assert!(matches!(v2.validate_basic(), Err(LedgerError::InvalidTransfer(_))));

        let mut long_receiver = msg("aevmos", 1);
        long_receiver.receiver = "a".repeat(MAX_RECEIVER_LEN + 1);
        assert!(matches!(long_receiver.validate_basic(), Err(LedgerError::InvalidAddress(_))));
    }

    #[test]
    fn denom_queries() {
        let (mut ctx, _, keeper) = setup();
        let voucher = Denom::new("uatom", vec![Hop::new("transfer", "channel-0")]);
        let hash = hex::encode_upper(voucher.hash());

        assert_eq!(keeper.denom(&mut ctx, &hash), Err(LedgerError::DenomNotFound));
        assert_eq!(keeper.denom_hash(&mut ctx, &voucher.path()), Err(LedgerError::DenomNotFound));

        keeper.set_denom(&mut ctx, &voucher).unwrap();
        assert_eq!(keeper.denom(&mut ctx, &hash).unwrap(), voucher);
        assert_eq!(keeper.denom_hash(&mut ctx, &voucher.path()).unwrap(), hash);
        assert!(matches!(keeper.denom(&mut ctx, "xyz"), Err(LedgerError::InvalidDenomHash(_))));
    }

    #[test]
    fn denoms_paginate_with_next_key() {
        let (mut ctx, _, keeper) = setup();
        for channel in ["channel-0", "channel-1", "channel-2"] {
            let denom = Denom::new("uatom", vec![Hop::new("transfer", channel)]);
            keeper.set_denom(&mut ctx, &denom).unwrap();
        }

        let (first, page) = keeper
            .denoms(&mut ctx, &PageRequest { limit: 2, count_total: true, ..Default::default() })
            .unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(page.total, 3);
        assert!(!page.next_key.is_empty());

        let (rest, page) = keeper
            .denoms(&mut ctx, &PageRequest { key: page.next_key, limit: 2, ..Default::default() })
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert!(page.next_key.is_empty());
        assert!(!first.contains(&rest[0]));
    }
}
