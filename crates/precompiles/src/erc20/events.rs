use crate::abi::IERC20;
use alloy::sol_types::SolEvent;
use alloy_primitives::{Address, Log, U256};

pub(super) fn transfer_log(token: Address, from: Address, to: Address, value: U256) -> Log {
    Log { address: token, data: IERC20::Transfer { from, to, value }.encode_log_data() }
}

pub(super) fn approval_log(token: Address, owner: Address, spender: Address, value: U256) -> Log {
    Log { address: token, data: IERC20::Approval { owner, spender, value }.encode_log_data() }
}
