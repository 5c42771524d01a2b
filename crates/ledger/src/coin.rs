use crate::{error::LedgerError, math::Int};
use alloy_primitives::U256;
use core::fmt;
use serde::{Deserialize, Serialize};

const DENOM_MIN_LEN: usize = 3;
const DENOM_MAX_LEN: usize = 128;

/// Checks a denomination: a letter followed by 2..=127 of `[a-zA-Z0-9/:._-]`.
pub fn validate_denom(denom: &str) -> Result<(), LedgerError> {
    let mut chars = denom.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let body_ok =
        chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | ':' | '.' | '_' | '-'));
    if !starts_with_letter || !body_ok || !(DENOM_MIN_LEN..=DENOM_MAX_LEN).contains(&denom.len()) {
        return Err(LedgerError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}

/// An amount of a single denomination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: Int,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: impl Into<Int>) -> Self {
        Self { denom: denom.into(), amount: amount.into() }
    }

    /// Validates the denomination and rejects negative amounts.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_denom(&self.denom)?;
        if self.amount.is_negative() {
            return Err(LedgerError::InvalidCoins(format!("negative coin amount: {}", self.amount)));
        }
        Ok(())
    }

    pub fn is_positive(&self) -> bool {
        self.amount.is_positive()
    }

    /// Amount as [`U256`], rejecting negative or oversized values.
    pub fn amount_u256(&self) -> Result<U256, LedgerError> {
        self.amount.to_u256().ok_or_else(|| LedgerError::InvalidCoins(self.to_string()))
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Unit of a denomination with its decimal exponent relative to the base.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenomUnit {
    pub denom: String,
    pub exponent: u32,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Bank metadata for a denomination.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DenomMetadata {
    pub description: String,
    pub denom_units: Vec<DenomUnit>,
    pub base: String,
    pub display: String,
    pub name: String,
    pub symbol: String,
}

impl DenomMetadata {
    /// Exponent of the display unit, if one is listed.
    pub fn display_exponent(&self) -> Option<u32> {
        self.denom_units.iter().find(|unit| unit.denom == self.display).map(|unit| unit.exponent)
    }
}
