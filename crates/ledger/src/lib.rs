//! Ledger-side state and keepers consumed by the bridge precompiles.
//!
//! The crate models the slice of a Cosmos-style ledger that the ERC-20 and ICS-20
//! precompiles call into:
//!
//! | Module     | Contents                                                         |
//! |------------|------------------------------------------------------------------|
//! | [`context`]| Branchable key-value context with gas metering and event buffer  |
//! | [`bank`]   | Coin balances, denomination metadata and the `MsgSend` server    |
//! | [`erc20`]  | Token pair registry and the allowance store                      |
//! | [`ibc`]    | Identifier validation, channels, denom traces and transfers      |
//! | [`math`]   | Signed arbitrary-width integer used for allowance arithmetic     |
//!
//! Keepers are stateless handles; all state lives in the [`Context`] they are handed,
//! so a precompile can run a call inside a branch and commit or discard it as a unit.

pub mod address;
pub mod bank;
pub mod coin;
pub mod context;
pub mod erc20;
pub mod error;
pub mod events;
pub mod gas;
pub mod ibc;
pub mod math;
pub mod store;

pub use address::{from_bech32, to_bech32};
pub use bank::{BankKeeper, BankMsgServer, BankSend, MemoryBank, MsgSend};
pub use coin::{Coin, DenomMetadata, DenomUnit};
pub use context::{BlockHeader, Context, SharedContext};
pub use erc20::{AllowanceKeeper, Erc20Keeper, Owner, TokenPair};
pub use error::LedgerError;
pub use events::{Attribute, Event};
pub use gas::{GasConfig, GasMeter};
pub use math::Int;
pub use store::KvStore;
