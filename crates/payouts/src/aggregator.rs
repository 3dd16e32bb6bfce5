//! Cycle aggregation
//!
//! Drives share allocation and payout derivation across a range of cycles and
//! records one commitment per delegator per cycle in the ledger.
//!
//! Each cycle is computed in full before anything is written, so a failed
//! cycle leaves the ledger untouched. Across a range, cycles completed before
//! the failure stay recorded and the error names the failing cycle.

use crate::allocation::allocate_shares;
use crate::errors::{PayoutError, Result};
use crate::ledger::ContractLedger;
use crate::params::PayoutParams;
use crate::payout::calculate_payout;
use crate::snapshot::SnapshotProvider;
use crate::types::{Address, Amount, Commitment, Cycle, DelegateCycleState};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Per-cycle result, before it is written to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    pub state: DelegateCycleState,
    pub total_rewards: Amount,
    /// One per delegator, in ledger order
    pub commitments: Vec<Commitment>,
    pub spill_index: Option<usize>,
}

impl CycleOutcome {
    pub fn summary(&self) -> CycleSummary {
        CycleSummary {
            cycle: self.state.cycle,
            staking_balance: self.state.staking_balance,
            roll_capacity: self.state.roll_capacity,
            spillage: self.state.spillage(),
            total_rewards: self.total_rewards,
            total_share: self.commitments.iter().map(|c| c.share_percentage).sum(),
            total_net_payout: self.commitments.iter().map(|c| c.net_payout).sum(),
            spilled: self.spill_index.is_some(),
        }
    }
}

/// Summary of a processed cycle for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub cycle: Cycle,
    pub staking_balance: Amount,
    pub roll_capacity: Amount,
    /// Delegate stake above the last complete roll
    pub spillage: Amount,
    pub total_rewards: Amount,
    pub total_share: Amount,
    pub total_net_payout: Amount,
    pub spilled: bool,
}

/// Computes commitments for one delegate against a snapshot provider.
pub struct CycleAggregator<'a, P: ?Sized> {
    provider: &'a P,
    delegate: Address,
    params: PayoutParams,
}

impl<'a, P: SnapshotProvider + ?Sized> CycleAggregator<'a, P> {
    /// Create an aggregator; rejects invalid parameters up front.
    pub fn new(provider: &'a P, delegate: Address, params: PayoutParams) -> Result<Self> {
        params.validate()?;
        Ok(Self {
            provider,
            delegate,
            params,
        })
    }

    pub fn delegate(&self) -> &Address {
        &self.delegate
    }

    pub fn params(&self) -> &PayoutParams {
        &self.params
    }

    /// Fetch the delegated address list (newest-first from the provider) and
    /// build an oldest-first ledger from it.
    pub fn load_ledger(&self, cycle: Option<Cycle>) -> Result<ContractLedger> {
        let addresses = self
            .provider
            .delegated_addresses(&self.delegate, cycle)
            .map_err(|source| PayoutError::SnapshotUnavailable {
                cycle,
                call: "delegated_addresses",
                source,
            })?;
        if addresses.is_empty() {
            return Err(PayoutError::NoDelegatedContracts { cycle });
        }
        Ok(ContractLedger::from_newest_first(&self.delegate, addresses))
    }

    /// Compute one cycle's commitments without touching the ledger.
    pub fn compute_cycle(&self, ledger: &ContractLedger, cycle: Cycle) -> Result<CycleOutcome> {
        if ledger.is_empty() {
            return Err(PayoutError::NoDelegatedContracts { cycle: Some(cycle) });
        }

        let staking_balance = self
            .provider
            .delegate_staking_balance(&self.delegate, cycle)
            .map_err(|e| PayoutError::snapshot(cycle, "delegate_staking_balance", e))?;
        let state = DelegateCycleState::new(cycle, staking_balance, self.params.roll_quantum);

        let balances = ledger
            .addresses()
            .map(|address| {
                self.provider
                    .account_balance_at_snapshot(address, cycle)
                    .map_err(|e| PayoutError::snapshot(cycle, "account_balance_at_snapshot", e))
            })
            .collect::<Result<Vec<Amount>>>()?;

        let total_rewards = self
            .provider
            .cycle_total_rewards(cycle)
            .map_err(|e| PayoutError::snapshot(cycle, "cycle_total_rewards", e))?;

        let allocation = allocate_shares(&state, &balances, self.params.spillage);

        let commitments = ledger
            .iter()
            .zip(balances)
            .zip(allocation.shares)
            .map(|((delegator, balance), share)| {
                let commitment = calculate_payout(
                    Commitment::new(cycle, balance).with_share(share),
                    self.params.fee_rate,
                    total_rewards,
                    delegator.is_delegate,
                );
                debug!(
                    target: "payouts",
                    "Cycle {}: {} staked {} share {} net {}",
                    cycle,
                    delegator.address,
                    commitment.staked_amount,
                    commitment.share_percentage,
                    commitment.net_payout
                );
                commitment
            })
            .collect();

        Ok(CycleOutcome {
            state,
            total_rewards,
            commitments,
            spill_index: allocation.spill_index,
        })
    }

    /// Compute one cycle and record its commitments.
    pub fn process_cycle(&self, ledger: &mut ContractLedger, cycle: Cycle) -> Result<CycleSummary> {
        let outcome = self.compute_cycle(ledger, cycle)?;
        Ok(commit_outcome(ledger, outcome))
    }

    /// Process `start..=end` in ascending order, stopping at the first failure.
    ///
    /// An empty range (`start > end`) processes nothing.
    pub fn process_cycle_range(
        &self,
        ledger: &mut ContractLedger,
        start: Cycle,
        end: Cycle,
    ) -> Result<Vec<CycleSummary>> {
        let mut summaries = Vec::new();
        for cycle in start..=end {
            match self.process_cycle(ledger, cycle) {
                Ok(summary) => summaries.push(summary),
                Err(err) => return Err(abort_range(start, end, cycle, err)),
            }
        }
        Ok(summaries)
    }
}

impl<'a, P: SnapshotProvider + Sync + ?Sized> CycleAggregator<'a, P> {
    /// Same contract as [`CycleAggregator::process_cycle_range`], with cycles
    /// computed concurrently. Results are merged in ascending cycle order on
    /// the calling thread, so cycles before the first failure are recorded and
    /// later ones are discarded.
    pub fn process_cycle_range_parallel(
        &self,
        ledger: &mut ContractLedger,
        start: Cycle,
        end: Cycle,
    ) -> Result<Vec<CycleSummary>> {
        let outcomes: Vec<(Cycle, Result<CycleOutcome>)> = {
            let snapshot: &ContractLedger = ledger;
            (start..=end)
                .into_par_iter()
                .map(|cycle| (cycle, self.compute_cycle(snapshot, cycle)))
                .collect()
        };

        let mut summaries = Vec::with_capacity(outcomes.len());
        for (cycle, outcome) in outcomes {
            match outcome {
                Ok(outcome) => summaries.push(commit_outcome(ledger, outcome)),
                Err(err) => return Err(abort_range(start, end, cycle, err)),
            }
        }
        Ok(summaries)
    }
}

fn commit_outcome(ledger: &mut ContractLedger, outcome: CycleOutcome) -> CycleSummary {
    let summary = outcome.summary();
    ledger.record_cycle(outcome.commitments);
    info!(
        target: "payouts",
        "Cycle {}: {} delegators, capacity {} of {} (+{}), rewards {}, net paid {}{}",
        summary.cycle,
        ledger.len(),
        summary.roll_capacity,
        summary.staking_balance,
        summary.spillage,
        summary.total_rewards,
        summary.total_net_payout,
        if summary.spilled { " (spilled)" } else { "" }
    );
    summary
}

fn abort_range(start: Cycle, end: Cycle, cycle: Cycle, err: PayoutError) -> PayoutError {
    warn!(
        target: "payouts",
        "Cycle range {}-{} aborted at cycle {}: {}", start, end, cycle, err
    );
    PayoutError::CycleRangeAborted {
        start,
        end,
        cycle,
        source: Box::new(err),
    }
}
