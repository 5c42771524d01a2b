//! Execution context handed to every keeper call.
//!
//! A [`Context`] owns the key-value state, the active gas meter and the ledger
//! event buffer. Precompile calls open a branch with their own meter and gas
//! config, and either commit it into the parent or discard it together with the
//! events it emitted.
//!
//! A committed call whose enclosing EVM frame may still revert is parked as a
//! pending write tagged with an EVM checkpoint number. Pending writes are read
//! through like any other overlay; [`Context::revert_pending`] drops the ones the
//! EVM has rolled back and [`Context::settle_pending`] folds the survivors into
//! the committed state.

use crate::{
    error::LedgerError,
    events::Event,
    gas::{GasConfig, GasMeter},
    store::KvStore,
};
use alloy_primitives::U256;
use parking_lot::{Mutex, MutexGuard};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Block header fields visible to keepers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockHeader {
    pub chain_id: String,
    pub height: u64,
    /// Block time in nanoseconds since the Unix epoch.
    pub time: u64,
}

#[derive(Debug)]
struct Branch {
    gas_meter: GasMeter,
    gas_config: GasConfig,
    events_mark: usize,
}

#[derive(Debug)]
struct PendingWrite {
    checkpoint: u64,
    events_mark: usize,
}

/// Branchable ledger state with gas accounting.
#[derive(Debug)]
pub struct Context {
    header: BlockHeader,
    store: KvStore,
    gas_meter: GasMeter,
    gas_config: GasConfig,
    /// Parked overlays, oldest first; they sit below every open branch.
    pending: Vec<PendingWrite>,
    branches: Vec<Branch>,
    events: Vec<Event>,
}

impl Context {
    /// Root context with an infinite meter and standard store charges.
    pub fn new(header: BlockHeader) -> Self {
        Self {
            header,
            store: KvStore::new(),
            gas_meter: GasMeter::infinite(),
            gas_config: GasConfig::kv(),
            pending: Vec::new(),
            branches: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Header of the block being executed.
    pub const fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn set_header(&mut self, header: BlockHeader) {
        self.header = header;
    }

    pub const fn block_height(&self) -> u64 {
        self.header.height
    }

    /// Meter of the innermost branch, or the root meter.
    pub fn gas_meter(&self) -> &GasMeter {
        self.branches.last().map_or(&self.gas_meter, |branch| &branch.gas_meter)
    }

    fn gas_meter_mut(&mut self) -> &mut GasMeter {
        match self.branches.last_mut() {
            Some(branch) => &mut branch.gas_meter,
            None => &mut self.gas_meter,
        }
    }

    /// Gas config of the innermost branch, or the root config.
    pub fn gas_config(&self) -> GasConfig {
        self.branches.last().map_or(self.gas_config, |branch| branch.gas_config)
    }

    /// Charges the innermost meter.
    pub fn consume_gas(
        &mut self,
        amount: u64,
        descriptor: &'static str,
    ) -> Result<(), LedgerError> {
        self.gas_meter_mut().consume(amount, descriptor)
    }

    /// Opens a branch metered by `gas_meter` and charged with `gas_config`.
    pub fn branch(&mut self, gas_meter: GasMeter, gas_config: GasConfig) {
        self.store.branch();
        self.branches.push(Branch { gas_meter, gas_config, events_mark: self.events.len() });
    }

    /// Number of open branches.
    pub fn depth(&self) -> usize {
        self.branches.len()
    }

    /// Folds the innermost branch into its parent and returns its meter.
    pub fn commit(&mut self) -> Result<GasMeter, LedgerError> {
        let branch = self.branches.pop().ok_or(LedgerError::NoOpenBranch)?;
        self.store.commit()?;
        Ok(branch.gas_meter)
    }

    /// Drops the innermost branch's writes and events and returns its meter.
    pub fn discard(&mut self) -> Result<GasMeter, LedgerError> {
        let branch = self.branches.pop().ok_or(LedgerError::NoOpenBranch)?;
        self.store.discard()?;
        self.events.truncate(branch.events_mark);
        Ok(branch.gas_meter)
    }

    /// Whether the innermost branch has written state or emitted events.
    pub fn branch_is_dirty(&self) -> bool {
        self.branches.last().is_some_and(|branch| {
            self.store.is_top_dirty() || self.events.len() > branch.events_mark
        })
    }

    /// Closes the only open branch but keeps its writes and events as a pending
    /// write tagged with `checkpoint`.
    pub fn park(&mut self, checkpoint: u64) -> Result<GasMeter, LedgerError> {
        if self.branches.len() > 1 {
            return Err(LedgerError::UnsettledBranch(self.branches.len() - 1));
        }
        let branch = self.branches.pop().ok_or(LedgerError::NoOpenBranch)?;
        self.pending.push(PendingWrite { checkpoint, events_mark: branch.events_mark });
        Ok(branch.gas_meter)
    }

    /// Number of parked writes not yet settled.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drops every pending write tagged at or above `live` and returns how many
    /// were dropped.
    ///
    /// Checkpoints grow with parking order, so the dropped writes are always the
    /// newest ones.
    pub fn revert_pending(&mut self, live: u64) -> Result<usize, LedgerError> {
        self.ensure_no_branch()?;
        let mut dropped = 0;
        while let Some(write) = self.pending.last() {
            if write.checkpoint < live {
                break;
            }
            self.events.truncate(write.events_mark);
            self.store.discard()?;
            self.pending.pop();
            dropped += 1;
        }
        Ok(dropped)
    }

    /// Drops pending writes at or above `live` and folds the rest into the
    /// committed state.
    pub fn settle_pending(&mut self, live: u64) -> Result<(), LedgerError> {
        self.revert_pending(live)?;
        while self.pending.pop().is_some() {
            self.store.commit()?;
        }
        Ok(())
    }

    fn ensure_no_branch(&self) -> Result<(), LedgerError> {
        match self.branches.len() {
            0 => Ok(()),
            open => Err(LedgerError::UnsettledBranch(open)),
        }
    }

    /// Metered read.
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, LedgerError> {
        let config = self.gas_config();
        self.consume_gas(config.read_cost_flat, "ReadFlat")?;
        let value = self.store.get(key).map(<[u8]>::to_vec);
        if let Some(value) = &value {
            self.consume_gas(per_byte(config.read_cost_per_byte, value.len()), "ReadPerByte")?;
        }
        Ok(value)
    }

    pub fn has(&mut self, key: &[u8]) -> Result<bool, LedgerError> {
        let config = self.gas_config();
        self.consume_gas(config.has_cost, "Has")?;
        Ok(self.store.has(key))
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), LedgerError> {
        let config = self.gas_config();
        self.consume_gas(config.write_cost_flat, "WriteFlat")?;
        self.consume_gas(
            per_byte(config.write_cost_per_byte, key.len() + value.len()),
            "WritePerByte",
        )?;
        self.store.set(key, value);
        Ok(())
    }

    pub fn delete(&mut self, key: &[u8]) -> Result<(), LedgerError> {
        let config = self.gas_config();
        self.consume_gas(config.delete_cost, "Delete")?;
        self.store.delete(key);
        Ok(())
    }

    /// Live entries under `prefix`, charging one iteration step plus a read per entry.
    pub fn prefix_entries(
        &mut self,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>, LedgerError> {
        let config = self.gas_config();
        let entries = self.store.prefix_entries(prefix);
        for (key, value) in &entries {
            self.consume_gas(config.iter_next_cost_flat, "IterNextFlat")?;
            self.consume_gas(
                per_byte(config.read_cost_per_byte, key.len() + value.len()),
                "ValuePerByte",
            )?;
        }
        Ok(entries)
    }

    pub fn get_json<T: DeserializeOwned>(&mut self, key: &[u8]) -> Result<Option<T>, LedgerError> {
        self.get(key)?
            .map(|bytes| serde_json::from_slice(&bytes))
            .transpose()
            .map_err(|err| LedgerError::Codec(err.to_string()))
    }

    pub fn set_json<T: Serialize>(&mut self, key: Vec<u8>, value: &T) -> Result<(), LedgerError> {
        let bytes = serde_json::to_vec(value).map_err(|err| LedgerError::Codec(err.to_string()))?;
        self.set(key, bytes)
    }

    pub fn get_u256(&mut self, key: &[u8]) -> Result<Option<U256>, LedgerError> {
        match self.get(key)? {
            Some(bytes) if bytes.len() == 32 => Ok(Some(U256::from_be_slice(&bytes))),
            Some(bytes) => {
                Err(LedgerError::Codec(format!("expected 32 bytes, got {}", bytes.len())))
            }
            None => Ok(None),
        }
    }

    /// Stores `value`, deleting the key when it is zero.
    pub fn set_u256(&mut self, key: Vec<u8>, value: U256) -> Result<(), LedgerError> {
        if value.is_zero() {
            return self.delete(&key);
        }
        self.set(key, value.to_be_bytes::<32>().to_vec())
    }

    /// Appends a ledger event; a discarded branch drops the events it emitted.
    pub fn emit_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Raw store view; reads through it are not metered.
    pub const fn store(&self) -> &KvStore {
        &self.store
    }
}

fn per_byte(cost: u64, len: usize) -> u64 {
    cost.saturating_mul(len as u64)
}

/// Shared handle to a [`Context`], held by precompiles installed into the EVM.
#[derive(Clone, Debug)]
pub struct SharedContext(Arc<Mutex<Context>>);

impl SharedContext {
    pub fn new(context: Context) -> Self {
        Self(Arc::new(Mutex::new(context)))
    }

    /// Locks the context for the duration of one call.
    pub fn lock(&self) -> MutexGuard<'_, Context> {
        self.0.lock()
    }
}
