//! Address-to-precompile registry built once at startup.

use crate::{
    checkpoint, config::BridgeConfig, erc20::Erc20Precompile, error::PrecompileCallError,
    ics20::Ics20Precompile, werc20::Werc20Precompile,
};
use alloy_evm::{
    precompiles::{DynPrecompile, Precompile, PrecompileInput, PrecompilesMap},
    revm::precompile::{PrecompileError, PrecompileId, PrecompileResult},
    EvmInternals,
};
use alloy_primitives::Address;
use bridge_ledger::{
    ibc::{ChannelKeeper, MemoryChannelKeeper, MemoryTransferKeeper, TransferKeeper},
    AllowanceKeeper, BankKeeper, BankMsgServer, BankSend, Erc20Keeper, MemoryBank, SharedContext,
};
use eyre::{bail, Result, WrapErr};
use std::{collections::BTreeMap, sync::Arc};
use tracing::{debug, info};

/// Ledger collaborators the precompiles call into.
#[derive(Clone, Debug)]
pub struct Keepers {
    pub bank: Arc<dyn BankKeeper>,
    /// Message-server path used for ERC-20 transfers.
    pub bank_send: Arc<dyn BankSend>,
    pub allowances: Arc<dyn AllowanceKeeper>,
    pub transfer: Arc<dyn TransferKeeper>,
    pub channels: Arc<dyn ChannelKeeper>,
}

impl Keepers {
    /// Keepers that keep all state in the shared [`Context`](bridge_ledger::Context).
    pub fn in_memory(bank: MemoryBank) -> Self {
        Self {
            bank: Arc::new(bank.clone()),
            bank_send: Arc::new(BankMsgServer::new(bank.clone())),
            allowances: Arc::new(Erc20Keeper),
            transfer: Arc::new(MemoryTransferKeeper::new(bank)),
            channels: Arc::new(MemoryChannelKeeper),
        }
    }
}

/// A registered bridge precompile.
#[derive(Clone, Debug)]
pub enum BridgeEntry {
    Ics20(Arc<Ics20Precompile>),
    Erc20(Arc<Erc20Precompile>),
    /// The native coin pair, wrapped.
    Werc20(Arc<Werc20Precompile>),
}

impl BridgeEntry {
    /// Identifier reported to revm.
    pub fn id(&self) -> &'static PrecompileId {
        match self {
            Self::Ics20(_) => Ics20Precompile::id(),
            Self::Erc20(_) => Erc20Precompile::id(),
            Self::Werc20(_) => Werc20Precompile::id(),
        }
    }

    /// Runs one EVM call against the entry.
    pub fn call(&self, input: PrecompileInput<'_>) -> PrecompileResult {
        match self {
            Self::Ics20(precompile) => precompile.call(input),
            Self::Erc20(precompile) => precompile.call(input),
            Self::Werc20(precompile) => precompile.call(input),
        }
    }
}

/// Bridge precompiles keyed by the address they are installed at.
#[derive(Clone, Debug)]
pub struct PrecompileRegistry {
    entries: BTreeMap<Address, BridgeEntry>,
    ctx: SharedContext,
}

impl PrecompileRegistry {
    /// Registers the ICS-20 precompile and one ERC-20 precompile per enabled
    /// token pair found in `ctx`. The pair of the EVM coin is served as WERC20.
    pub fn new(config: BridgeConfig, keepers: Keepers, ctx: SharedContext) -> Result<Self> {
        config.validate().wrap_err("Invalid bridge configuration")?;

        let mut entries = BTreeMap::new();
        let ics20 = Ics20Precompile::new(config.clone(), keepers.clone(), ctx.clone());
        entries.insert(config.ics20_address, BridgeEntry::Ics20(Arc::new(ics20)));

        let pairs = Erc20Keeper
            .token_pairs(&mut ctx.lock())
            .wrap_err("Failed to load token pairs")?;
        for pair in pairs.into_iter().filter(|pair| pair.enabled) {
            let address = pair.erc20_address;
            if entries.contains_key(&address) {
                bail!(
                    "token pair {} collides with a registered precompile at {address}",
                    pair.denom
                );
            }
            let denom = pair.denom.clone();
            let erc20 = Erc20Precompile::new(pair, config.clone(), keepers.clone(), ctx.clone());
            let entry = if erc20.is_evm_coin() {
                info!(target: "bridge_runner", %address, %denom, "registering WERC20 precompile");
                BridgeEntry::Werc20(Arc::new(Werc20Precompile::new(erc20)))
            } else {
                info!(target: "bridge_runner", %address, %denom, "registering ERC-20 precompile");
                BridgeEntry::Erc20(Arc::new(erc20))
            };
            entries.insert(address, entry);
        }

        Ok(Self { entries, ctx })
    }

    /// Builds the registry from the `BRIDGE_*` environment variables.
    pub fn from_env(keepers: Keepers, ctx: SharedContext) -> Result<Self> {
        let config = BridgeConfig::from_env().wrap_err("Invalid bridge environment")?;
        Self::new(config, keepers, ctx)
    }

    /// Builds the registry from the `bridge` object of the chainspec extras.
    ///
    /// Returns `None` when the chainspec carries no bridge configuration.
    pub fn from_chainspec_extras(
        extras: &serde_json::Value,
        keepers: Keepers,
        ctx: SharedContext,
    ) -> Result<Option<Self>> {
        let Some(config) = BridgeConfig::from_chainspec_extras(extras)
            .wrap_err("Invalid bridge extras in chainspec")?
        else {
            return Ok(None);
        };
        Self::new(config, keepers, ctx).map(Some)
    }

    /// Entry installed at `address`.
    pub fn get(&self, address: &Address) -> Option<&BridgeEntry> {
        self.entries.get(address)
    }

    /// Number of installed precompiles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops ledger writes of calls the EVM journal has since reverted.
    ///
    /// Every call does this on entry; hosts call it after the last call of a
    /// transaction to keep the ledger in step with the EVM.
    pub fn reconcile(&self, internals: &mut EvmInternals<'_>) -> Result<(), PrecompileError> {
        checkpoint::reconcile(&mut self.ctx.lock(), internals)
            .map(drop)
            .map_err(PrecompileCallError::into_precompile_error)
    }

    /// Folds the ledger writes of committed calls into the ledger state.
    ///
    /// `live` is the counter stored at
    /// [`LEDGER_CHECKPOINT_ADDR`](checkpoint::LEDGER_CHECKPOINT_ADDR) in the
    /// post-block state; writes tagged at or above it are dropped.
    pub fn settle(&self, live: u64) -> Result<()> {
        let mut ctx = self.ctx.lock();
        let pending = ctx.pending_len();
        ctx.settle_pending(live).wrap_err("Failed to settle pending ledger writes")?;
        debug!(target: "bridge_runner", live, pending, "settled ledger writes");
        Ok(())
    }

    /// Installs every registered precompile into `precompiles`.
    pub fn install(&self, precompiles: &mut PrecompilesMap) {
        for (address, entry) in &self.entries {
            let entry = entry.clone();
            let id = entry.id().clone();

            precompiles.apply_precompile(address, move |_| {
                let entry_for_call = entry;
                let id_for_call = id;
                Some(DynPrecompile::new_stateful(id_for_call, move |input| {
                    entry_for_call.call(input)
                }))
            });
        }
    }
}
