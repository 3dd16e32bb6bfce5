//! Snapshot provider interface
//!
//! Supplies per-cycle staking balances, delegated address lists and cycle
//! reward totals. Network access, retries and snapshot selection belong to
//! implementors; the core only consumes answers.

use crate::types::{Address, Amount, Cycle};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Interface to the chain state a payout run is computed from.
pub trait SnapshotProvider {
    /// Total balance staked with `delegate` at the cycle's snapshot.
    fn delegate_staking_balance(&self, delegate: &Address, cycle: Cycle) -> Result<Amount>;

    /// Balance of `address` at the cycle's snapshot.
    fn account_balance_at_snapshot(&self, address: &Address, cycle: Cycle) -> Result<Amount>;

    /// Addresses delegated to `delegate` at `cycle`, or at head when `None`.
    /// Listed newest-first, as the chain reports them.
    fn delegated_addresses(&self, delegate: &Address, cycle: Option<Cycle>) -> Result<Vec<Address>>;

    /// Rewards earned by the delegate for the cycle.
    fn cycle_total_rewards(&self, cycle: Cycle) -> Result<Amount>;
}

/// Recorded state for a single cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CycleSnapshot {
    pub staking_balance: Amount,
    pub total_rewards: Amount,
    #[serde(default)]
    pub balances: BTreeMap<Address, Amount>,
    #[serde(default)]
    pub delegated: Vec<Address>,
}

/// Fixture-backed provider for one delegate (tests and offline runs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemorySnapshotProvider {
    pub delegate: Address,
    #[serde(default)]
    pub cycles: BTreeMap<Cycle, CycleSnapshot>,
    #[serde(default)]
    pub head: Vec<Address>,
}

impl InMemorySnapshotProvider {
    pub fn new(delegate: Address) -> Self {
        Self {
            delegate,
            cycles: BTreeMap::new(),
            head: Vec::new(),
        }
    }

    pub fn with_cycle(mut self, cycle: Cycle, snapshot: CycleSnapshot) -> Self {
        self.cycles.insert(cycle, snapshot);
        self
    }

    pub fn with_head(mut self, head: Vec<Address>) -> Self {
        self.head = head;
        self
    }

    fn cycle(&self, cycle: Cycle) -> Result<&CycleSnapshot> {
        self.cycles
            .get(&cycle)
            .ok_or_else(|| anyhow!("no snapshot recorded for cycle {cycle}"))
    }

    fn check_delegate(&self, delegate: &Address) -> Result<()> {
        if delegate != &self.delegate {
            return Err(anyhow!(
                "provider holds snapshots for {}, not {}",
                self.delegate,
                delegate
            ));
        }
        Ok(())
    }
}

impl SnapshotProvider for InMemorySnapshotProvider {
    fn delegate_staking_balance(&self, delegate: &Address, cycle: Cycle) -> Result<Amount> {
        self.check_delegate(delegate)?;
        Ok(self.cycle(cycle)?.staking_balance)
    }

    fn account_balance_at_snapshot(&self, address: &Address, cycle: Cycle) -> Result<Amount> {
        self.cycle(cycle)?
            .balances
            .get(address)
            .copied()
            .ok_or_else(|| anyhow!("no balance for {address} at cycle {cycle}"))
    }

    fn delegated_addresses(
        &self,
        delegate: &Address,
        cycle: Option<Cycle>,
    ) -> Result<Vec<Address>> {
        self.check_delegate(delegate)?;
        match cycle {
            Some(c) => Ok(self.cycle(c)?.delegated.clone()),
            None => Ok(self.head.clone()),
        }
    }

    fn cycle_total_rewards(&self, cycle: Cycle) -> Result<Amount> {
        Ok(self.cycle(cycle)?.total_rewards)
    }
}
