//! Dispatch shell shared by the bridge precompiles.
//!
//! [`execute`] runs one decoded call against the ledger [`Context`]:
//!
//! 1. refuse native value sent to a non-payable method
//! 2. decode the method and arguments
//! 3. refuse state-changing methods in a read-only frame
//! 4. charge the static up-front gas
//! 5. run the method inside a ledger branch metered with the remaining gas
//! 6. hand the queued EVM side effects to `finalize`
//! 7. commit the branch, or discard it on any failure
//!
//! [`run`] adapts that shell to revm's [`PrecompileInput`] and parks the
//! committed writes behind the EVM journal (see [`checkpoint`](crate::checkpoint)).

use crate::{
    checkpoint,
    error::{BridgeError, PrecompileCallError},
    journal::CallJournal,
};
use alloy_evm::{precompiles::PrecompileInput, revm::precompile::PrecompileResult};
use alloy_primitives::{Address, Bytes, U256};
use bridge_ledger::{Context, GasConfig, GasMeter, LedgerError, SharedContext};
use core::fmt;
use revm::precompile::PrecompileOutput;
use tracing::{debug, warn};

/// A method of a bridge precompile.
pub trait PrecompileMethod: Copy + fmt::Debug + Sized + 'static {
    /// Every method the precompile answers.
    const ALL: &'static [Self];

    /// ABI selector of the method.
    fn selector(&self) -> [u8; 4];

    /// Solidity name, used in logs.
    fn name(&self) -> &'static str;

    /// Whether the method writes ledger state.
    fn is_transaction(&self) -> bool;

    /// Whether the method accepts native value.
    fn is_payable(&self) -> bool {
        false
    }

    fn from_selector(selector: [u8; 4]) -> Option<Self> {
        Self::ALL.iter().copied().find(|method| method.selector() == selector)
    }

    /// Method named by the first four bytes of `input`.
    fn from_input(input: &[u8]) -> Option<Self> {
        let selector: [u8; 4] = input.get(..4)?.try_into().ok()?;
        Self::from_selector(selector)
    }
}

/// EVM frame the precompile was called in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallFrame {
    /// `msg.sender`.
    pub caller: Address,
    /// Address the precompile was called at.
    pub target: Address,
    /// Native value sent with the call, in 18-decimal units.
    pub value: U256,
    /// Gas available to the call.
    pub gas: u64,
    /// Set inside `STATICCALL`.
    pub read_only: bool,
}

/// Everything a method body may touch.
#[derive(Debug)]
pub struct CallScope<'a> {
    pub ctx: &'a mut Context,
    pub frame: &'a CallFrame,
    pub journal: &'a mut CallJournal,
}

/// A precompile driven by [`execute`].
pub trait BridgePrecompile {
    type Method: PrecompileMethod;
    type Call;

    fn address(&self) -> Address;

    /// Store charges applied to the method's ledger calls.
    fn gas_config(&self) -> GasConfig;

    /// Gas charged before the method runs.
    fn required_gas(&self, input: &[u8]) -> u64;

    fn decode(&self, input: &[u8]) -> Result<(Self::Method, Self::Call), PrecompileCallError>;

    fn execute_method(
        &self,
        scope: &mut CallScope<'_>,
        method: Self::Method,
        call: Self::Call,
    ) -> Result<Bytes, PrecompileCallError>;
}

/// Result of a successful call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallOutcome {
    pub output: Bytes,
    /// Up-front charge plus the ledger gas consumed by the method.
    pub gas_used: u64,
}

/// Runs `input` against `ctx`; see the module docs for the sequence.
pub fn execute<P, F>(
    precompile: &P,
    ctx: &mut Context,
    frame: &CallFrame,
    input: &[u8],
    finalize: F,
) -> Result<CallOutcome, PrecompileCallError>
where
    P: BridgePrecompile,
    F: FnOnce(&CallJournal) -> Result<(), PrecompileCallError>,
{
    let payable = P::Method::from_input(input).is_some_and(|method| method.is_payable());
    if !frame.value.is_zero() && !payable {
        warn!(
            target: "bridge_runner",
            precompile = %precompile.address(),
            caller = %frame.caller,
            value = %frame.value,
            "rejecting call carrying value"
        );
        return Err(BridgeError::CannotReceiveFunds(frame.value).into());
    }

    let (method, call) = precompile.decode(input)?;
    if frame.read_only && method.is_transaction() {
        return Err(BridgeError::WriteProtection.into());
    }

    let required = precompile.required_gas(input);
    let Some(remaining) = frame.gas.checked_sub(required) else {
        return Err(PrecompileCallError::OutOfGas);
    };
    debug!(
        target: "bridge_runner",
        precompile = %precompile.address(),
        method = method.name(),
        caller = %frame.caller,
        required,
        gas = frame.gas,
        "dispatching precompile call"
    );

    ctx.branch(GasMeter::new(remaining), precompile.gas_config());
    let mut journal = CallJournal::default();
    let mut scope = CallScope { ctx: &mut *ctx, frame, journal: &mut journal };
    let result = precompile.execute_method(&mut scope, method, call);
    let result = result.and_then(|output| {
        let gas_used = required.saturating_add(ctx.gas_meter().consumed());
        if gas_used > frame.gas {
            return Err(PrecompileCallError::OutOfGas);
        }
        finalize(&journal)?;
        Ok(CallOutcome { output, gas_used })
    });

    match result {
        Ok(outcome) => {
            ctx.commit().map_err(branch_error)?;
            Ok(outcome)
        }
        Err(err) => {
            ctx.discard().map_err(branch_error)?;
            debug!(
                target: "bridge_runner",
                precompile = %precompile.address(),
                method = method.name(),
                %err,
                "precompile call failed"
            );
            Err(err)
        }
    }
}

fn branch_error(err: LedgerError) -> PrecompileCallError {
    BridgeError::Ledger(err).into()
}

/// revm entry point: runs the call against the shared ledger context and
/// applies its side effects to the EVM journal.
pub fn run<P: BridgePrecompile>(
    precompile: &P,
    ctx: &SharedContext,
    mut input: PrecompileInput<'_>,
) -> PrecompileResult {
    let frame = CallFrame {
        caller: input.caller,
        target: input.target_address,
        value: input.value,
        gas: input.gas,
        read_only: input.is_static,
    };
    let data = input.data;
    let internals = input.internals_mut();
    let block_number = internals.block_number().saturating_to::<u64>();

    let mut ctx = ctx.lock();
    if ctx.block_height() != block_number {
        let mut header = ctx.header().clone();
        header.height = block_number;
        ctx.set_header(header);
    }

    checkpoint::journaled(&mut ctx, internals, |ctx, internals| {
        execute(precompile, ctx, &frame, data, |journal| journal.apply(internals))
    })
    .map(|outcome| PrecompileOutput::new(outcome.gas_used, outcome.output))
    .map_err(PrecompileCallError::into_precompile_error)
}
