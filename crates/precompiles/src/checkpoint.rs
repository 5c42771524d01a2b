//! Binds ledger writes to the EVM journal.
//!
//! Every state-changing call bumps a counter kept in an EVM storage slot and
//! parks its ledger writes under the counter value it replaced. A checkpoint
//! revert in the EVM rolls the counter back with everything else, so on the next
//! call the ledger drops each pending write whose tag is no longer below the
//! counter. Hosts read the same slot at block end and pass it to
//! [`Context::settle_pending`].

use crate::error::{BridgeError, PrecompileCallError};
use alloy_evm::{EvmInternals, EvmInternalsError};
use alloy_primitives::{address, Address, U256};
use bridge_ledger::{Context, GasConfig, GasMeter, LedgerError};
use tracing::debug;

/// Account holding the ledger checkpoint counter.
pub const LEDGER_CHECKPOINT_ADDR: Address = address!("0x00000000000000000000000000000000000008ff");

/// Storage slot of the counter.
pub const LEDGER_CHECKPOINT_SLOT: U256 = U256::ZERO;

/// Number of ledger writes the EVM journal currently keeps alive.
pub fn live_checkpoint(internals: &mut EvmInternals<'_>) -> Result<u64, PrecompileCallError> {
    let slot = internals
        .sload(LEDGER_CHECKPOINT_ADDR, LEDGER_CHECKPOINT_SLOT)
        .map_err(state_error)?;
    Ok(slot.data.saturating_to())
}

/// Drops pending ledger writes the EVM has reverted and returns the live counter.
pub fn reconcile(
    ctx: &mut Context,
    internals: &mut EvmInternals<'_>,
) -> Result<u64, PrecompileCallError> {
    let live = live_checkpoint(internals)?;
    let dropped = ctx.revert_pending(live).map_err(ledger_error)?;
    if dropped > 0 {
        debug!(target: "bridge_runner", live, dropped, "dropped reverted ledger writes");
    }
    Ok(live)
}

/// Runs `call` in a ledger branch that is parked behind the EVM counter when it
/// writes anything, and discarded otherwise.
pub fn journaled<T, F>(
    ctx: &mut Context,
    internals: &mut EvmInternals<'_>,
    call: F,
) -> Result<T, PrecompileCallError>
where
    F: FnOnce(&mut Context, &mut EvmInternals<'_>) -> Result<T, PrecompileCallError>,
{
    let live = reconcile(ctx, internals)?;
    ctx.branch(GasMeter::infinite(), GasConfig::free());

    let result = call(ctx, internals).and_then(|value| {
        let dirty = ctx.branch_is_dirty();
        if dirty {
            advance(internals, live)?;
        }
        Ok((value, dirty))
    });
    match result {
        Ok((value, true)) => {
            ctx.park(live).map_err(ledger_error)?;
            Ok(value)
        }
        Ok((value, false)) => {
            ctx.discard().map_err(ledger_error)?;
            Ok(value)
        }
        Err(err) => {
            ctx.discard().map_err(ledger_error)?;
            Err(err)
        }
    }
}

fn advance(internals: &mut EvmInternals<'_>, live: u64) -> Result<(), PrecompileCallError> {
    // a nonce keeps the account non-empty so state clearing leaves the slot alone
    let nonce = internals.load_account(LEDGER_CHECKPOINT_ADDR).map_err(state_error)?.info.nonce;
    if nonce == 0 {
        internals.bump_nonce(LEDGER_CHECKPOINT_ADDR).map_err(state_error)?;
    }
    internals
        .sstore(LEDGER_CHECKPOINT_ADDR, LEDGER_CHECKPOINT_SLOT, U256::from(live.saturating_add(1)))
        .map_err(state_error)?;
    Ok(())
}

fn state_error(err: EvmInternalsError) -> PrecompileCallError {
    PrecompileCallError::State(err.to_string())
}

fn ledger_error(err: LedgerError) -> PrecompileCallError {
    BridgeError::Ledger(err).into()
}
