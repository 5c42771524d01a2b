//! Coin balances and the bank `MsgSend` server.

use crate::{
    coin::{Coin, DenomMetadata},
    context::Context,
    error::LedgerError,
    events::Event,
};
use alloy_primitives::{Address, U256};
use core::fmt;
use std::collections::HashSet;
use tracing::debug;

/// Bank event types.
pub const EVENT_TYPE_COIN_SPENT: &str = "coin_spent";
pub const EVENT_TYPE_COIN_RECEIVED: &str = "coin_received";
pub const EVENT_TYPE_TRANSFER: &str = "transfer";
pub const EVENT_TYPE_BURN: &str = "burn";

const BALANCES_PREFIX: &[u8] = b"bank/balances/";
const SUPPLY_PREFIX: &[u8] = b"bank/supply/";
const METADATA_PREFIX: &[u8] = b"bank/metadata/";
const SEND_DISABLED_PREFIX: &[u8] = b"bank/send_disabled/";

/// Read and movement access to coin balances.
pub trait BankKeeper: Send + Sync + fmt::Debug {
    fn balance(
        &self,
        ctx: &mut Context,
        address: Address,
        denom: &str,
    ) -> Result<U256, LedgerError>;

    /// Balance the account may move right now.
    fn spendable_balance(
        &self,
        ctx: &mut Context,
        address: Address,
        denom: &str,
    ) -> Result<U256, LedgerError>;

    fn supply(&self, ctx: &mut Context, denom: &str) -> Result<U256, LedgerError>;

    fn denom_metadata(
        &self,
        ctx: &mut Context,
        denom: &str,
    ) -> Result<Option<DenomMetadata>, LedgerError>;

    fn is_send_enabled(&self, ctx: &mut Context, denom: &str) -> Result<bool, LedgerError>;

    /// Whether `address` is barred from receiving funds.
    fn is_blocked(&self, address: Address) -> bool;

    /// Moves `coin` from `from` to `to`, failing on insufficient spendable balance.
    fn send_coins(
        &self,
        ctx: &mut Context,
        from: Address,
        to: Address,
        coin: &Coin,
    ) -> Result<(), LedgerError>;

    /// Removes `coin` from `from` and from the total supply.
    fn burn_coins(&self, ctx: &mut Context, from: Address, coin: &Coin) -> Result<(), LedgerError>;
}

/// Bank send message for a single coin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MsgSend {
    pub from: Address,
    pub to: Address,
    pub amount: Coin,
}

impl MsgSend {
    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        if self.from.is_zero() {
            return Err(LedgerError::InvalidAddress("empty sender address".to_string()));
        }
        if self.to.is_zero() {
            return Err(LedgerError::InvalidAddress("empty recipient address".to_string()));
        }
        self.amount.validate()?;
        if !self.amount.is_positive() {
            return Err(LedgerError::InvalidCoins(self.amount.to_string()));
        }
        Ok(())
    }
}

/// Capability to execute a bank send, as the ERC-20 precompile sees it.
pub trait BankSend: Send + Sync + fmt::Debug {
    fn send(&self, ctx: &mut Context, msg: &MsgSend) -> Result<(), LedgerError>;
}

/// Message server wrapping a [`BankKeeper`].
#[derive(Clone, Debug)]
pub struct BankMsgServer<K> {
    keeper: K,
}

impl<K> BankMsgServer<K> {
    pub const fn new(keeper: K) -> Self {
        Self { keeper }
    }

    pub const fn keeper(&self) -> &K {
        &self.keeper
    }
}

impl<K: BankKeeper> BankSend for BankMsgServer<K> {
    fn send(&self, ctx: &mut Context, msg: &MsgSend) -> Result<(), LedgerError> {
        msg.validate_basic()?;
        if !self.keeper.is_send_enabled(ctx, &msg.amount.denom)? {
            return Err(LedgerError::SendDisabled(msg.amount.denom.clone()));
        }
        if self.keeper.is_blocked(msg.to) {
            return Err(LedgerError::BlockedRecipient(msg.to));
        }
        self.keeper.send_coins(ctx, msg.from, msg.to, &msg.amount)
    }
}

/// Bank keeper backed by the context store.
#[derive(Clone, Debug, Default)]
pub struct MemoryBank {
    blocked: HashSet<Address>,
}

impl MemoryBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bank that refuses deposits into `blocked` addresses.
    pub fn with_blocked(blocked: impl IntoIterator<Item = Address>) -> Self {
        Self { blocked: blocked.into_iter().collect() }
    }

    /// Credits `amount` to `to` and grows the supply.
    pub fn mint(
        &self,
        ctx: &mut Context,
        to: Address,
        denom: &str,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let balance = self.balance(ctx, to, denom)?;
        let supply = self.supply(ctx, denom)?;
        let overflow = || LedgerError::InvalidCoins(format!("{amount}{denom}"));
        self.set_balance(ctx, to, denom, balance.checked_add(amount).ok_or_else(overflow)?)?;
        ctx.set_u256(supply_key(denom), supply.checked_add(amount).ok_or_else(overflow)?)
    }

    pub fn set_denom_metadata(
        &self,
        ctx: &mut Context,
        metadata: &DenomMetadata,
    ) -> Result<(), LedgerError> {
        ctx.set_json(denom_key(METADATA_PREFIX, &metadata.base), metadata)
    }

    pub fn set_send_enabled(
        &self,
        ctx: &mut Context,
        denom: &str,
        enabled: bool,
    ) -> Result<(), LedgerError> {
        let key = denom_key(SEND_DISABLED_PREFIX, denom);
        if enabled {
            ctx.delete(&key)
        } else {
            ctx.set(key, vec![1])
        }
    }

    fn set_balance(
        &self,
        ctx: &mut Context,
        address: Address,
        denom: &str,
        amount: U256,
    ) -> Result<(), LedgerError> {
        ctx.set_u256(balance_key(address, denom), amount)
    }

    fn sub_spendable(
        &self,
        ctx: &mut Context,
        address: Address,
        coin: &Coin,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let spendable = self.spendable_balance(ctx, address, &coin.denom)?;
        let remaining = spendable.checked_sub(amount).ok_or_else(|| {
            LedgerError::InsufficientFunds {
                spendable: format!("{spendable}{}", coin.denom),
                required: coin.to_string(),
            }
        })?;
        self.set_balance(ctx, address, &coin.denom, remaining)
    }
}

impl BankKeeper for MemoryBank {
    fn balance(
        &self,
        ctx: &mut Context,
        address: Address,
        denom: &str,
    ) -> Result<U256, LedgerError> {
        Ok(ctx.get_u256(&balance_key(address, denom))?.unwrap_or_default())
    }

    fn spendable_balance(
        &self,
        ctx: &mut Context,
        address: Address,
        denom: &str,
    ) -> Result<U256, LedgerError> {
        self.balance(ctx, address, denom)
    }

    fn supply(&self, ctx: &mut Context, denom: &str) -> Result<U256, LedgerError> {
        Ok(ctx.get_u256(&denom_key(SUPPLY_PREFIX, denom))?.unwrap_or_default())
    }

    fn denom_metadata(
        &self,
        ctx: &mut Context,
        denom: &str,
    ) -> Result<Option<DenomMetadata>, LedgerError> {
        ctx.get_json(&denom_key(METADATA_PREFIX, denom))
    }

    fn is_send_enabled(&self, ctx: &mut Context, denom: &str) -> Result<bool, LedgerError> {
        Ok(!ctx.has(&denom_key(SEND_DISABLED_PREFIX, denom))?)
    }

    fn is_blocked(&self, address: Address) -> bool {
        self.blocked.contains(&address)
    }

    fn send_coins(
        &self,
        ctx: &mut Context,
        from: Address,
        to: Address,
        coin: &Coin,
    ) -> Result<(), LedgerError> {
        coin.validate()?;
        let amount = coin.amount_u256()?;
        self.sub_spendable(ctx, from, coin, amount)?;

        let to_balance = self.balance(ctx, to, &coin.denom)?;
        let credited = to_balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidCoins(coin.to_string()))?;
        self.set_balance(ctx, to, &coin.denom, credited)?;

        debug!(target: "bridge_ledger", %from, %to, %coin, "bank send");
        let amount = coin.to_string();
        ctx.emit_event(
            Event::new(EVENT_TYPE_COIN_SPENT)
                .with_attribute("spender", from.to_string())
                .with_attribute("amount", amount.clone()),
        );
        ctx.emit_event(
            Event::new(EVENT_TYPE_COIN_RECEIVED)
                .with_attribute("receiver", to.to_string())
                .with_attribute("amount", amount.clone()),
        );
        ctx.emit_event(
            Event::new(EVENT_TYPE_TRANSFER)
                .with_attribute("recipient", to.to_string())
                .with_attribute("sender", from.to_string())
                .with_attribute("amount", amount),
        );
        Ok(())
    }

    fn burn_coins(&self, ctx: &mut Context, from: Address, coin: &Coin) -> Result<(), LedgerError> {
        coin.validate()?;
        let amount = coin.amount_u256()?;
        self.sub_spendable(ctx, from, coin, amount)?;
        let supply = self.supply(ctx, &coin.denom)?;
        ctx.set_u256(denom_key(SUPPLY_PREFIX, &coin.denom), supply.saturating_sub(amount))?;
        ctx.emit_event(
            Event::new(EVENT_TYPE_BURN)
                .with_attribute("burner", from.to_string())
                .with_attribute("amount", coin.to_string()),
        );
        Ok(())
    }
}

fn balance_key(address: Address, denom: &str) -> Vec<u8> {
    [BALANCES_PREFIX, address.as_slice(), b"/", denom.as_bytes()].concat()
}

fn supply_key(denom: &str) -> Vec<u8> {
    denom_key(SUPPLY_PREFIX, denom)
}

fn denom_key(prefix: &[u8], denom: &str) -> Vec<u8> {
    [prefix, denom.as_bytes()].concat()
}
