//! Share allocation with roll spillage
//!
//! A delegate earns rewards only for stake backed by complete rolls. Each
//! delegator's share is its balance over that roll capacity. With spillage
//! enabled, capacity is handed out in ledger order: the delegator whose
//! balance crosses the capacity boundary is credited only for the part that
//! still fits, and everyone after it gets nothing.

use crate::types::{Amount, DelegateCycleState};
use tracing::{debug, warn};

/// Outcome of allocating one cycle's capacity
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    /// Share per balance, in input order
    pub shares: Vec<Amount>,
    /// Index of the delegator that crossed the capacity boundary, if any
    pub spill_index: Option<usize>,
}

impl Allocation {
    pub fn spilled(&self) -> bool {
        self.spill_index.is_some()
    }

    pub fn total_share(&self) -> Amount {
        self.shares.iter().copied().sum()
    }
}

/// Compute share percentages for `balances` (ledger order) against the
/// delegate's roll capacity.
///
/// With zero roll capacity nothing earns: every share is zero.
pub fn allocate_shares(
    state: &DelegateCycleState,
    balances: &[Amount],
    spillage: bool,
) -> Allocation {
    let capacity = state.roll_capacity;
    if capacity <= Amount::ZERO {
        warn!(
            target: "payouts",
            "Cycle {}: staking balance {} is below one roll, no shares allocated",
            state.cycle,
            state.staking_balance
        );
        return Allocation {
            shares: vec![Amount::ZERO; balances.len()],
            spill_index: None,
        };
    }

    let mut remaining = capacity;
    let mut spill_index = None;
    let mut shares = Vec::with_capacity(balances.len());

    for (index, &balance) in balances.iter().enumerate() {
        let before = remaining;
        remaining -= balance;

        let share = if spillage && spill_index.is_some() {
            Amount::ZERO
        } else if spillage && remaining < Amount::ZERO {
            spill_index = Some(index);
            debug!(
                target: "payouts",
                "Cycle {}: delegator #{} crosses roll capacity ({} of {} fits)",
                state.cycle,
                index,
                before.max(Amount::ZERO),
                balance
            );
            // balance + remaining == before: only the part still inside capacity
            before.max(Amount::ZERO) / capacity
        } else {
            balance / capacity
        };
        shares.push(share);
    }

    Allocation {
        shares,
        spill_index,
    }
}
