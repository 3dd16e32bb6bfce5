//! Contract ledger
//!
//! In-memory collection of delegators and their per-cycle commitment history.
//! Order is significant: the allocator walks delegators in ledger order when
//! deciding who falls inside the delegate's roll capacity.

use crate::types::{Address, Amount, Commitment, Cycle, Delegator};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractLedger {
    delegators: Vec<Delegator>,
}

impl ContractLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger in the given order, flagging `delegate`'s own account.
    ///
    /// Repeated addresses are kept once, at their first position.
    pub fn from_addresses<I>(delegate: &Address, addresses: I) -> Self
    where
        I: IntoIterator<Item = Address>,
    {
        let mut ledger = Self::new();
        for address in addresses {
            let delegator = if &address == delegate {
                Delegator::delegate(address)
            } else {
                Delegator::new(address)
            };
            ledger.push(delegator);
        }
        ledger
    }

    /// Build a ledger from a newest-first listing (as chain RPCs return it),
    /// stored oldest-first.
    pub fn from_newest_first<I>(delegate: &Address, addresses: I) -> Self
    where
        I: IntoIterator<Item = Address>,
    {
        let mut ledger = Self::from_addresses(delegate, addresses);
        ledger.reverse_order();
        ledger
    }

    /// Reverse delegator order in place. Must run before any cycle is processed.
    pub fn reverse_order(&mut self) {
        self.delegators.reverse();
    }

    /// Append a delegator unless its address is already in the ledger.
    ///
    /// Returns `false` when the address was already present; the existing
    /// entry and its position are kept.
    pub fn push(&mut self, delegator: Delegator) -> bool {
        if self.get(&delegator.address).is_some() {
            debug!(target: "payouts", "Skipping repeated address {}", delegator.address);
            return false;
        }
        self.delegators.push(delegator);
        true
    }

    pub fn len(&self) -> usize {
        self.delegators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delegators.is_empty()
    }

    pub fn delegators(&self) -> &[Delegator] {
        &self.delegators
    }

    pub fn iter(&self) -> impl Iterator<Item = &Delegator> {
        self.delegators.iter()
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.delegators.iter().map(|d| &d.address)
    }

    pub fn get(&self, address: &Address) -> Option<&Delegator> {
        self.delegators.iter().find(|d| &d.address == address)
    }

    /// Store one cycle's commitments, positionally matched to ledger order.
    ///
    /// Callers pass exactly one commitment per delegator; the aggregator builds
    /// the whole vector before calling so a failed cycle records nothing.
    pub(crate) fn record_cycle(&mut self, commitments: Vec<Commitment>) {
        debug_assert_eq!(commitments.len(), self.delegators.len());
        for (delegator, commitment) in self.delegators.iter_mut().zip(commitments) {
            let cycle = commitment.cycle;
            if delegator.record(commitment) {
                debug!(
                    target: "payouts",
                    "Replaced commitment for {} at cycle {}", delegator.address, cycle
                );
            }
        }
    }

    /// Cycles for which every delegator holds a commitment
    pub fn completed_cycles(&self) -> Vec<Cycle> {
        let Some(first) = self.delegators.first() else {
            return Vec::new();
        };
        let mut cycles: Vec<Cycle> = first
            .commitments()
            .iter()
            .map(|c| c.cycle)
            .filter(|&cycle| {
                self.delegators
                    .iter()
                    .all(|d| d.commitment_for(cycle).is_some())
            })
            .collect();
        cycles.sort_unstable();
        cycles
    }

    /// Sum of every delegator's net payouts
    pub fn total_payout(&self) -> Amount {
        self.delegators.iter().map(Delegator::total_payout).sum()
    }
}
