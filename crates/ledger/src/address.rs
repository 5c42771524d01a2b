//! Bech32 rendering of 20-byte account addresses.

use crate::error::LedgerError;
use alloy_primitives::Address;
use bech32::{Bech32, Hrp};

const ADDRESS_LEN: usize = 20;

/// Encodes `address` under the human-readable `prefix`.
pub fn to_bech32(prefix: &str, address: Address) -> Result<String, LedgerError> {
    let hrp = Hrp::parse(prefix).map_err(|err| LedgerError::InvalidAddress(err.to_string()))?;
    bech32::encode::<Bech32>(hrp, address.as_slice())
        .map_err(|err| LedgerError::InvalidAddress(err.to_string()))
}

/// Decodes a bech32 account address into its prefix and 20-byte payload.
pub fn from_bech32(value: &str) -> Result<(String, Address), LedgerError> {
    let (hrp, data) = bech32::decode(value)
        .map_err(|err| LedgerError::InvalidAddress(format!("{value}: {err}")))?;
    if data.len() != ADDRESS_LEN {
        return Err(LedgerError::InvalidAddress(format!(
            "{value}: expected 20 bytes, got {}",
            data.len()
        )));
    }
    Ok((hrp.to_string(), Address::from_slice(&data)))
}
