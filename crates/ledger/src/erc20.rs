//! Token pair registry and ERC-20 allowance store.

use crate::{
    context::Context,
    error::LedgerError,
    math::{Int, MAX_BIT_LEN},
};
use alloy_primitives::{Address, U256};
use core::fmt;
use serde::{Deserialize, Serialize};
use tracing::trace;

const TOKEN_PAIR_PREFIX: &[u8] = b"erc20/pairs/";
const TOKEN_PAIR_BY_DENOM_PREFIX: &[u8] = b"erc20/pairs_by_denom/";
const ALLOWANCE_PREFIX: &[u8] = b"erc20/allowances/";

/// Which side of the pair issued the asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Owner {
    /// Native ledger coin exposed through a precompile.
    Module,
    /// Token originally deployed as an EVM contract.
    External,
}

/// Mapping between an ERC-20 contract address and a bank denomination.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub erc20_address: Address,
    pub denom: String,
    pub enabled: bool,
    pub owner: Owner,
}

impl TokenPair {
    /// Enabled pair.
    pub fn new(erc20_address: Address, denom: impl Into<String>, owner: Owner) -> Self {
        Self { erc20_address, denom: denom.into(), enabled: true, owner }
    }

    pub fn is_native_coin(&self) -> bool {
        self.owner == Owner::Module
    }
}

/// Allowance storage keyed by (token, owner, spender).
///
/// Absence of an entry means an allowance of zero; implementations never store zero.
pub trait AllowanceKeeper: Send + Sync + fmt::Debug {
    fn allowance(
        &self,
        ctx: &mut Context,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError>;

    /// Stores an allowance of at most 256 bits; zero removes the entry.
    fn set_allowance(
        &self,
        ctx: &mut Context,
        token: Address,
        owner: Address,
        spender: Address,
        value: &Int,
    ) -> Result<(), LedgerError>;

    fn delete_allowance(
        &self,
        ctx: &mut Context,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<(), LedgerError>;
}

/// Keeper for token pairs and allowances.
#[derive(Clone, Copy, Debug, Default)]
pub struct Erc20Keeper;

impl Erc20Keeper {
    pub const fn new() -> Self {
        Self
    }

    pub fn register_token_pair(
        &self,
        ctx: &mut Context,
        pair: &TokenPair,
    ) -> Result<(), LedgerError> {
        ctx.set_json(pair_key(pair.erc20_address), pair)?;
        let by_denom = [TOKEN_PAIR_BY_DENOM_PREFIX, pair.denom.as_bytes()].concat();
        ctx.set(by_denom, pair.erc20_address.to_vec())
    }

    pub fn token_pair(
        &self,
        ctx: &mut Context,
        token: Address,
    ) -> Result<Option<TokenPair>, LedgerError> {
        ctx.get_json(&pair_key(token))
    }

    pub fn token_pair_by_denom(
        &self,
        ctx: &mut Context,
        denom: &str,
    ) -> Result<Option<TokenPair>, LedgerError> {
        match ctx.get(&[TOKEN_PAIR_BY_DENOM_PREFIX, denom.as_bytes()].concat())? {
            Some(address) if address.len() == 20 => {
                self.token_pair(ctx, Address::from_slice(&address))
            }
            Some(_) => Err(LedgerError::Codec(format!("corrupt token pair index for {denom}"))),
            None => Ok(None),
        }
    }

    /// Every registered pair, ordered by contract address.
    pub fn token_pairs(&self, ctx: &mut Context) -> Result<Vec<TokenPair>, LedgerError> {
        ctx.prefix_entries(TOKEN_PAIR_PREFIX)?
            .into_iter()
            .map(|(_, bytes)| {
                serde_json::from_slice(&bytes).map_err(|err| LedgerError::Codec(err.to_string()))
            })
            .collect()
    }

    pub fn set_token_pair_enabled(
        &self,
        ctx: &mut Context,
        token: Address,
        enabled: bool,
    ) -> Result<(), LedgerError> {
        let mut pair = self.token_pair(ctx, token)?.ok_or(LedgerError::TokenPairNotFound(token))?;
        pair.enabled = enabled;
        ctx.set_json(pair_key(token), &pair)
    }

    fn ensure_enabled_pair(&self, ctx: &mut Context, token: Address) -> Result<(), LedgerError> {
        let pair = self.token_pair(ctx, token)?.ok_or(LedgerError::TokenPairNotFound(token))?;
        if !pair.enabled {
            return Err(LedgerError::TokenPairDisabled(token));
        }
        Ok(())
    }
}

impl AllowanceKeeper for Erc20Keeper {
    fn allowance(
        &self,
        ctx: &mut Context,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, LedgerError> {
        Ok(ctx.get_u256(&allowance_key(token, owner, spender))?.unwrap_or_default())
    }

    fn set_allowance(
        &self,
        ctx: &mut Context,
        token: Address,
        owner: Address,
        spender: Address,
        value: &Int,
    ) -> Result<(), LedgerError> {
        self.ensure_enabled_pair(ctx, token)?;
        if owner.is_zero() {
            return Err(LedgerError::InvalidAllowance("erc20 owner is empty".to_string()));
        }
        if spender.is_zero() {
            return Err(LedgerError::InvalidAllowance("erc20 spender is empty".to_string()));
        }
        if value.is_negative() {
            return Err(LedgerError::InvalidAllowance(format!("value is negative: {value}")));
        }
        if value.bit_len() > MAX_BIT_LEN {
            return Err(LedgerError::InvalidAllowance(format!("value is out of bounds: {value}")));
        }
        let amount = value.to_u256().unwrap_or_default();
        trace!(target: "bridge_ledger", %token, %owner, %spender, %amount, "set allowance");
        ctx.set_u256(allowance_key(token, owner, spender), amount)
    }

    fn delete_allowance(
        &self,
        ctx: &mut Context,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<(), LedgerError> {
        self.ensure_enabled_pair(ctx, token)?;
        ctx.delete(&allowance_key(token, owner, spender))
    }
}

fn pair_key(token: Address) -> Vec<u8> {
    [TOKEN_PAIR_PREFIX, token.as_slice()].concat()
}

fn allowance_key(token: Address, owner: Address, spender: Address) -> Vec<u8> {
    [ALLOWANCE_PREFIX, token.as_slice(), owner.as_slice(), spender.as_slice()].concat()
}
