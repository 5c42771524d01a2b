use crate::error::LedgerError;

/// Per-operation gas charges applied by the [`Context`](crate::Context) store accessors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasConfig {
    pub has_cost: u64,
    pub delete_cost: u64,
    pub read_cost_flat: u64,
    pub read_cost_per_byte: u64,
    pub write_cost_flat: u64,
    pub write_cost_per_byte: u64,
    pub iter_next_cost_flat: u64,
}

impl GasConfig {
    /// Standard key-value store charges.
    pub const fn kv() -> Self {
        Self {
            has_cost: 1_000,
            delete_cost: 1_000,
            read_cost_flat: 1_000,
            read_cost_per_byte: 3,
            write_cost_flat: 2_000,
            write_cost_per_byte: 30,
            iter_next_cost_flat: 30,
        }
    }

    /// No charges; callers price the whole operation up front.
    pub const fn free() -> Self {
        Self {
            has_cost: 0,
            delete_cost: 0,
            read_cost_flat: 0,
            read_cost_per_byte: 0,
            write_cost_flat: 0,
            write_cost_per_byte: 0,
            iter_next_cost_flat: 0,
        }
    }
}

impl Default for GasConfig {
    fn default() -> Self {
        Self::kv()
    }
}

/// Tracks gas consumed against a fixed limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GasMeter {
    limit: u64,
    consumed: u64,
}

impl GasMeter {
    pub const fn new(limit: u64) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Meter that never runs out.
    pub const fn infinite() -> Self {
        Self::new(u64::MAX)
    }

    pub const fn limit(&self) -> u64 {
        self.limit
    }

    pub const fn consumed(&self) -> u64 {
        self.consumed
    }

    pub const fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.consumed)
    }

    pub const fn is_out_of_gas(&self) -> bool {
        self.consumed > self.limit
    }

    /// Charges `amount`. The charge is recorded even when it overruns the limit.
    pub fn consume(&mut self, amount: u64, descriptor: &'static str) -> Result<(), LedgerError> {
        self.consumed = self.consumed.saturating_add(amount);
        if self.consumed > self.limit {
            return Err(LedgerError::OutOfGas {
                descriptor,
                limit: self.limit,
                consumed: self.consumed,
            });
        }
        Ok(())
    }
}
