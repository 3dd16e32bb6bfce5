//! Delegated-address discovery
//!
//! Resolves which accounts delegate to a baker, either at a cycle's stake
//! snapshot or at the chain head, and extracts account addresses from raw
//! RPC response text.

use crate::errors::{PayoutError, Result};
use crate::types::{Address, Cycle};
use anyhow::Result as RpcResult;
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;

/// Implicit (`tz1`/`tz2`/`tz3`) or originated (`KT1`) account, base58 body
const ADDRESS_PATTERN: &str = r"\b(?:tz[123]|KT1)[1-9A-HJ-NP-Za-km-z]{33}\b";

/// Raw chain RPC access needed for address discovery.
pub trait DelegationRpc {
    /// Block level holding the stake snapshot used for `cycle`.
    fn snapshot_block_level(&self, cycle: Cycle) -> RpcResult<u64>;

    /// Hash of the block at `level`.
    fn block_hash(&self, level: u64) -> RpcResult<String>;

    /// GET `path` and return the response body.
    fn get(&self, path: &str) -> RpcResult<String>;
}

/// Extract addresses from response text, in order, first occurrence kept.
pub fn parse_delegated_addresses(text: &str) -> Result<Vec<Address>> {
    let pattern = Regex::new(ADDRESS_PATTERN)?;
    let mut seen = HashSet::new();
    Ok(pattern
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|addr| seen.insert(*addr))
        .map(Address::from)
        .collect())
}

fn delegated_contracts_path(block: &str, delegate: &Address) -> String {
    format!("/chains/main/blocks/{block}/context/delegates/{delegate}/delegated_contracts")
}

/// Addresses delegated to `delegate` at the stake snapshot of `cycle`.
pub fn delegated_contracts_for_cycle<R>(
    rpc: &R,
    delegate: &Address,
    cycle: Cycle,
) -> Result<Vec<Address>>
where
    R: DelegationRpc + ?Sized,
{
    let level = rpc
        .snapshot_block_level(cycle)
        .map_err(|e| PayoutError::snapshot(cycle, "snapshot_block_level", e))?;
    let hash = rpc
        .block_hash(level)
        .map_err(|e| PayoutError::snapshot(cycle, "block_hash", e))?;
    debug!(
        target: "payouts",
        "Cycle {}: snapshot block level {} ({})", cycle, level, hash
    );

    let body = rpc
        .get(&delegated_contracts_path(&hash, delegate))
        .map_err(|e| PayoutError::snapshot(cycle, "delegated_contracts", e))?;
    let addresses = parse_delegated_addresses(&body)?;
    if addresses.is_empty() {
        return Err(PayoutError::NoDelegatedContracts { cycle: Some(cycle) });
    }
    Ok(addresses)
}

/// Addresses currently delegated to `delegate`.
pub fn all_delegated_contracts<R>(rpc: &R, delegate: &Address) -> Result<Vec<Address>>
where
    R: DelegationRpc + ?Sized,
{
    let body = rpc
        .get(&delegated_contracts_path("head", delegate))
        .map_err(|source| PayoutError::SnapshotUnavailable {
            cycle: None,
            call: "delegated_contracts",
            source,
        })?;
    let addresses = parse_delegated_addresses(&body)?;
    if addresses.is_empty() {
        return Err(PayoutError::NoDelegatedContracts { cycle: None });
    }
    Ok(addresses)
}
