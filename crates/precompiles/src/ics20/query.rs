//! Denomination trace queries. An unknown denomination answers with an empty
//! value; a malformed hash or trace reverts.

use super::{
    types::{denom_to_abi, page_request_from_abi, page_response_to_abi},
    Ics20Precompile,
};
use crate::{
    abi::IICS20,
    error::{ics20_error, PrecompileCallError},
};
use alloy::sol_types::SolValue;
use alloy_primitives::Bytes;
use bridge_ledger::{Context, LedgerError};
use tracing::debug;

impl Ics20Precompile {
    pub(super) fn denom(
        &self,
        ctx: &mut Context,
        hash: &str,
    ) -> Result<Bytes, PrecompileCallError> {
        let denom = match self.keepers.transfer.denom(ctx, hash) {
            Ok(denom) => denom_to_abi(denom),
            Err(LedgerError::DenomNotFound) => {
                debug!(target: "ics20_precompile", hash, "denom not found");
                IICS20::Denom { base: String::new(), trace: Vec::new() }
            }
            Err(err) => return Err(ics20_error(err)),
        };
        Ok(denom.abi_encode().into())
    }

    pub(super) fn denoms(
        &self,
        ctx: &mut Context,
        page: IICS20::PageRequest,
    ) -> Result<Bytes, PrecompileCallError> {
        let (denoms, page) = self
            .keepers
            .transfer
            .denoms(ctx, &page_request_from_abi(page))
            .map_err(ics20_error)?;
        let denoms: Vec<IICS20::Denom> = denoms.into_iter().map(denom_to_abi).collect();
        Ok((denoms, page_response_to_abi(page)).abi_encode_params().into())
    }

    pub(super) fn denom_hash(
        &self,
        ctx: &mut Context,
        trace: &str,
    ) -> Result<Bytes, PrecompileCallError> {
        let hash = match self.keepers.transfer.denom_hash(ctx, trace) {
            Ok(hash) => hash,
            Err(LedgerError::DenomNotFound) => String::new(),
            Err(err) => return Err(ics20_error(err)),
        };
        Ok(hash.abi_encode().into())
    }
}
