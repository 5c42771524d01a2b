//! ICS-20 denomination traces.

use super::host::{validate_channel_identifier, validate_port_identifier};
use crate::error::LedgerError;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const IBC_DENOM_PREFIX: &str = "ibc/";

/// One port/channel step a token travelled through.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hop {
    pub port_id: String,
    pub channel_id: String,
}

impl Hop {
    pub fn new(port_id: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self { port_id: port_id.into(), channel_id: channel_id.into() }
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_port_identifier(&self.port_id)?;
        validate_channel_identifier(&self.channel_id)
    }
}

/// Base denomination plus the hops it took to arrive here, most recent first.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denom {
    pub base: String,
    pub trace: Vec<Hop>,
}

impl Denom {
    pub fn new(base: impl Into<String>, trace: Vec<Hop>) -> Self {
        Self { base: base.into(), trace }
    }

    /// Denomination issued on this chain.
    pub fn native(base: impl Into<String>) -> Self {
        Self::new(base, Vec::new())
    }

    pub fn is_native(&self) -> bool {
        self.trace.is_empty()
    }

    /// `port/channel/.../base`.
    pub fn path(&self) -> String {
        let mut path = String::new();
        for hop in &self.trace {
            path.push_str(&hop.port_id);
            path.push('/');
            path.push_str(&hop.channel_id);
            path.push('/');
        }
        path.push_str(&self.base);
        path
    }

    /// SHA-256 of [`Denom::path`].
    pub fn hash(&self) -> B256 {
        B256::from_slice(&Sha256::digest(self.path().as_bytes()))
    }

    /// Bank denomination: the base for native denoms, `ibc/{HASH}` otherwise.
    pub fn ibc_denom(&self) -> String {
        if self.is_native() {
            return self.base.clone();
        }
        format!("{IBC_DENOM_PREFIX}{}", hex::encode_upper(self.hash()))
    }

    /// Whether the most recent hop is `port_id/channel_id`.
    pub fn has_prefix(&self, port_id: &str, channel_id: &str) -> bool {
        self.trace.first().is_some_and(|hop| hop.port_id == port_id && hop.channel_id == channel_id)
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.base.trim().is_empty() {
            return Err(LedgerError::InvalidDenomTrace(
                "base denomination cannot be blank".to_string(),
            ));
        }
        self.trace.iter().try_for_each(Hop::validate)
    }

    /// Splits a full path into hops and base. Leading `port/channel` pairs
    /// are consumed while both identifiers are valid; the rest is the base.
    pub fn from_path(path: &str) -> Result<Self, LedgerError> {
        if path.is_empty() || path.starts_with('/') || path.ends_with('/') {
            return Err(LedgerError::InvalidDenomTrace(path.to_string()));
        }
        let parts: Vec<&str> = path.split('/').collect();
        let mut trace = Vec::new();
        let mut index = 0;
        while index + 2 < parts.len() {
            let hop = Hop::new(parts[index], parts[index + 1]);
            if hop.validate().is_err() {
                break;
            }
            trace.push(hop);
            index += 2;
        }
        let base = parts[index..].join("/");
        if base.split('/').any(str::is_empty) {
            return Err(LedgerError::InvalidDenomTrace(path.to_string()));
        }
        Ok(Self::new(base, trace))
    }
}

/// Parses a hex-encoded 32-byte denomination hash.
pub fn parse_hex_hash(hash: &str) -> Result<B256, LedgerError> {
    let bytes = hex::decode(hash).map_err(|_| LedgerError::InvalidDenomHash(hash.to_string()))?;
    if bytes.len() != B256::len_bytes() {
        return Err(LedgerError::InvalidDenomHash(hash.to_string()));
    }
    Ok(B256::from_slice(&bytes))
}

/// Extracts the hash of an `ibc/{hash}` voucher denomination.
pub fn voucher_hash(denom: &str) -> Result<B256, LedgerError> {
    let hash = denom
        .strip_prefix(IBC_DENOM_PREFIX)
        .ok_or_else(|| LedgerError::NoIbcVoucherDenom(denom.to_string()))?;
    parse_hex_hash(hash)
}

/// Decimals implied by the scale prefix of a base denomination.
pub fn derive_decimals_from_denom(base: &str) -> Result<u8, LedgerError> {
    match base.chars().next() {
        None => {
            Err(LedgerError::InvalidBaseDenom("base denom cannot be an empty string".to_string()))
        }
        Some('u') => Ok(6),
        Some('a') => Ok(18),
        Some(_) => Err(LedgerError::InvalidBaseDenom(format!(
            "should be either micro ('u[...]') or atto ('a[...]'); got: {base:?}"
        ))),
    }
}
