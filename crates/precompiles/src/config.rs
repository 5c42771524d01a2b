//! Bridge configuration: the chain's EVM coin and addressing parameters.

use crate::ics20::ICS20_PRECOMPILE_ADDR;
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};
use thiserror::Error;

/// Key of the bridge object inside the chainspec extras.
pub const CHAINSPEC_EXTRAS_KEY: &str = "bridge";

/// Base denom of the EVM coin.
pub const ENV_EVM_DENOM: &str = "BRIDGE_EVM_DENOM";
/// 18-decimal denom the EVM sees.
pub const ENV_EVM_EXTENDED_DENOM: &str = "BRIDGE_EVM_EXTENDED_DENOM";
/// Decimals of the base denom, 18 when unset.
pub const ENV_EVM_DECIMALS: &str = "BRIDGE_EVM_DECIMALS";
/// Account address prefix.
pub const ENV_BECH32_PREFIX: &str = "BRIDGE_BECH32_PREFIX";
/// Optional override of the ICS-20 precompile address.
pub const ENV_ICS20_ADDRESS: &str = "BRIDGE_ICS20_ADDRESS";

/// Decimals of the EVM's native balance view.
pub const EVM_DECIMALS: u8 = 18;

/// The ledger coin that backs native EVM balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmCoinInfo {
    /// Bank denomination of the fee coin.
    pub denom: String,
    /// 18-decimal denomination; equals `denom` when `decimals` is 18.
    pub extended_denom: String,
    pub decimals: u8,
}

impl EvmCoinInfo {
    pub fn new(denom: impl Into<String>, extended_denom: impl Into<String>, decimals: u8) -> Self {
        Self { denom: denom.into(), extended_denom: extended_denom.into(), decimals }
    }

    /// Scales a ledger amount to the EVM's 18-decimal view.
    pub fn to_18_decimals(&self, amount: U256) -> Option<U256> {
        let shift = EVM_DECIMALS.checked_sub(self.decimals)?;
        amount.checked_mul(U256::from(10u64).checked_pow(U256::from(shift))?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.denom.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "evmCoin.denom" });
        }
        if self.extended_denom.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "evmCoin.extendedDenom" });
        }
        if !(1..=EVM_DECIMALS).contains(&self.decimals) {
            return Err(ConfigError::InvalidDecimals(self.decimals));
        }
        if self.decimals == EVM_DECIMALS && self.denom != self.extended_denom {
            return Err(ConfigError::ExtendedDenomMismatch {
                denom: self.denom.clone(),
                extended_denom: self.extended_denom.clone(),
            });
        }
        Ok(())
    }
}

/// Parameters every bridge precompile reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    pub evm_coin: EvmCoinInfo,
    /// Human-readable part of account addresses, e.g. `cosmos`.
    pub bech32_prefix: String,
    /// Address the ICS-20 precompile is installed at.
    #[serde(default = "default_ics20_address")]
    pub ics20_address: Address,
}

const fn default_ics20_address() -> Address {
    ICS20_PRECOMPILE_ADDR
}

impl BridgeConfig {
    pub fn new(evm_coin: EvmCoinInfo, bech32_prefix: impl Into<String>) -> Self {
        Self { evm_coin, bech32_prefix: bech32_prefix.into(), ics20_address: ICS20_PRECOMPILE_ADDR }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evm_coin.validate()?;
        if self.bech32_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyField { field: "bech32Prefix" });
        }
        if self.ics20_address.is_zero() {
            return Err(ConfigError::InvalidAddress("ics20Address cannot be zero".to_string()));
        }
        Ok(())
    }

    /// Reads the `bridge` object of the chainspec extras; `None` when absent.
    pub fn from_chainspec_extras(extras: &serde_json::Value) -> Result<Option<Self>, ConfigError> {
        let Some(raw) = extras.get(CHAINSPEC_EXTRAS_KEY) else {
            return Ok(None);
        };
        let config: Self = serde_json::from_value(raw.clone())?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Loads the configuration from the `BRIDGE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let denom = required_env(ENV_EVM_DENOM)?;
        let extended_denom =
            optional_env(ENV_EVM_EXTENDED_DENOM).unwrap_or_else(|| denom.clone());
        let decimals = match optional_env(ENV_EVM_DECIMALS) {
            Some(raw) => raw.parse::<u8>().map_err(|err| ConfigError::InvalidNumber {
                var: ENV_EVM_DECIMALS.into(),
                reason: err.to_string(),
            })?,
            None => EVM_DECIMALS,
        };
        let mut config = Self::new(
            EvmCoinInfo::new(denom, extended_denom, decimals),
            required_env(ENV_BECH32_PREFIX)?,
        );
        if let Some(raw) = optional_env(ENV_ICS20_ADDRESS) {
            config.ics20_address = Address::from_str(&raw)
                .map_err(|err| ConfigError::InvalidAddress(err.to_string()))?;
        }
        config.validate()?;
        Ok(config)
    }
}

fn required_env(var: &str) -> Result<String, ConfigError> {
    let raw = env::var(var).map_err(|_| ConfigError::MissingEnv { var: var.into() })?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::EmptyEnv { var: var.into() });
    }
    Ok(trimmed.to_string())
}

fn optional_env(var: &str) -> Option<String> {
    env::var(var).ok().map(|raw| raw.trim().to_string()).filter(|raw| !raw.is_empty())
}

/// Errors raised while loading a [`BridgeConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("environment variable {var} is not set")]
    MissingEnv {
        /// Name of the missing variable.
        var: String,
    },
    /// A required environment variable was empty or whitespace.
    #[error("environment variable {var} is empty")]
    EmptyEnv {
        /// Name of the empty variable.
        var: String,
    },
    /// A numeric environment variable failed to parse.
    #[error("environment variable {var} is not a valid number: {reason}")]
    InvalidNumber {
        /// Name of the variable.
        var: String,
        /// Parse failure.
        reason: String,
    },
    /// A required field was blank.
    #[error("{field} cannot be empty")]
    EmptyField {
        /// Config key of the field.
        field: &'static str,
    },
    /// Decimals outside 1..=18.
    #[error("evm coin decimals must be between 1 and 18, got {0}")]
    InvalidDecimals(u8),
    /// An 18-decimal coin must not declare a separate extended denom.
    #[error("extended denom {extended_denom} must equal denom {denom} for 18-decimal coins")]
    ExtendedDenomMismatch {
        /// Base denomination.
        denom: String,
        /// Extended denomination.
        extended_denom: String,
    },
    /// Address failed to parse or is unusable.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// Chainspec extras contained invalid values.
    #[error("invalid bridge extras in chainspec: {0}")]
    InvalidExtras(#[from] serde_json::Error),
}
