//! EVM precompiles that expose native ledger functionality.
//!
//! | Address                 | Precompile                                   |
//! |-------------------------|----------------------------------------------|
//! | `0x…0802` (default)     | [`ics20::Ics20Precompile`], IBC transfers    |
//! | token pair ERC-20 address | [`erc20::Erc20Precompile`], one per pair   |
//! | EVM coin pair address   | [`werc20::Werc20Precompile`], wrapped native |
//!
//! All of them are driven by the dispatch shell in [`runner`]: calls run inside a
//! branch of the shared ledger [`Context`](bridge_ledger::Context), and their
//! EVM-visible effects (native balance mirrors and logs) are queued in a
//! [`journal::CallJournal`] that is applied only when the call succeeds.
//! [`checkpoint`] keeps committed ledger writes revertible by the EVM journal
//! until the host settles them.
//! [`registry::PrecompileRegistry`] wires them into an `alloy_evm`
//! [`PrecompilesMap`](alloy_evm::precompiles::PrecompilesMap).

pub mod abi;
pub mod checkpoint;
pub mod config;
pub mod erc20;
pub mod error;
pub mod gas;
pub mod ics20;
pub mod journal;
pub mod registry;
pub mod runner;
pub mod werc20;

pub use config::{BridgeConfig, ConfigError, EvmCoinInfo};
pub use erc20::{Erc20Method, Erc20Precompile};
pub use error::{BridgeError, PrecompileCallError};
pub use ics20::{Ics20Method, Ics20Precompile, ICS20_PRECOMPILE_ADDR};
pub use checkpoint::{LEDGER_CHECKPOINT_ADDR, LEDGER_CHECKPOINT_SLOT};
pub use registry::{BridgeEntry, Keepers, PrecompileRegistry};
pub use werc20::{Werc20Method, Werc20Precompile};
