//! Static gas schedule.
//!
//! ERC-20 methods are priced by a fixed per-method table measured against the
//! equivalent Solidity implementation; their ledger calls run with a free gas
//! config. ICS-20 methods pay a flat store access plus a per-byte charge on the
//! ABI-encoded arguments up front and are then metered by the ledger's key-value
//! costs. WERC20 adds fixed prices for `deposit` and `withdraw`.

use bridge_ledger::GasConfig;

/// Fixed price of ERC-20 `transfer`.
pub const GAS_TRANSFER: u64 = 9_000;
pub const GAS_TRANSFER_FROM: u64 = 30_500;
pub const GAS_APPROVE: u64 = 8_100;
pub const GAS_INCREASE_ALLOWANCE: u64 = 8_580;
pub const GAS_DECREASE_ALLOWANCE: u64 = 3_620;
pub const GAS_NAME: u64 = 3_421;
pub const GAS_SYMBOL: u64 = 3_464;
pub const GAS_DECIMALS: u64 = 427;
pub const GAS_TOTAL_SUPPLY: u64 = 2_480;
pub const GAS_BALANCE_OF: u64 = 2_870;
pub const GAS_ALLOWANCE: u64 = 3_225;
/// Fixed price of WERC20 `deposit`.
pub const GAS_DEPOSIT: u64 = 23_878;
/// Fixed price of WERC20 `withdraw`.
pub const GAS_WITHDRAW: u64 = 9_207;

/// Up-front charge for a call whose ledger work is metered by `config`.
///
/// Only the arguments are priced; the 4-byte selector is free.
pub fn kv_required_gas(config: &GasConfig, input: &[u8], is_transaction: bool) -> u64 {
    let len = input.get(4..).map_or(0, <[u8]>::len) as u64;
    if is_transaction {
        config.write_cost_flat.saturating_add(config.write_cost_per_byte.saturating_mul(len))
    } else {
        config.read_cost_flat.saturating_add(config.read_cost_per_byte.saturating_mul(len))
    }
}
