//! Core types for delegator payout accounting
//!
//! Defines account addresses, cycle indices, per-cycle commitment records and
//! the delegator entries held by the contract ledger.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Cycle index (fixed-length accounting period on the chain)
pub type Cycle = u64;

/// Balance, share or currency amount
pub type Amount = Decimal;

/// Stake quantum: only complete rolls count toward reward-earning capacity
pub const DEFAULT_ROLL_QUANTUM: Amount = dec!(10000);

/// Account address as reported by the chain (e.g. `tz1...`, `KT1...`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// One delegator's stake, share and payout for one cycle.
///
/// Filled in stages: `staked_amount` from the snapshot, `share_percentage`
/// by the allocator, then the three payout fields by the payout calculator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub cycle: Cycle,
    pub staked_amount: Amount,
    pub share_percentage: Amount,
    pub gross_payout: Amount,
    pub fee: Amount,
    pub net_payout: Amount,
}

impl Commitment {
    /// Fresh commitment holding only the snapshot balance
    pub fn new(cycle: Cycle, staked_amount: Amount) -> Self {
        Self {
            cycle,
            staked_amount,
            share_percentage: Amount::ZERO,
            gross_payout: Amount::ZERO,
            fee: Amount::ZERO,
            net_payout: Amount::ZERO,
        }
    }

    pub fn with_share(mut self, share_percentage: Amount) -> Self {
        self.share_percentage = share_percentage;
        self
    }
}

/// Delegator entry: identity and commitment history.
///
/// Serialized output carries `total_payout`, computed from the commitments at
/// serialization time. It is ignored when reading a delegator back.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Delegator {
    pub address: Address,
    /// The delegate's own account; it is not charged a fee on its own payout
    pub is_delegate: bool,
    commitments: Vec<Commitment>,
}

impl Delegator {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            is_delegate: false,
            commitments: Vec::new(),
        }
    }

    pub fn delegate(address: Address) -> Self {
        Self {
            is_delegate: true,
            ..Self::new(address)
        }
    }

    /// Commitments in the order they were first recorded
    pub fn commitments(&self) -> &[Commitment] {
        &self.commitments
    }

    pub fn commitment_for(&self, cycle: Cycle) -> Option<&Commitment> {
        self.commitments.iter().find(|c| c.cycle == cycle)
    }

    /// Store a commitment, replacing any earlier one for the same cycle.
    ///
    /// Returns `true` when an existing record was replaced.
    pub fn record(&mut self, commitment: Commitment) -> bool {
        match self
            .commitments
            .iter_mut()
            .find(|c| c.cycle == commitment.cycle)
        {
            Some(existing) => {
                *existing = commitment;
                true
            }
            None => {
                self.commitments.push(commitment);
                false
            }
        }
    }

    /// Sum of net payouts over every recorded cycle
    pub fn total_payout(&self) -> Amount {
        self.commitments.iter().map(|c| c.net_payout).sum()
    }
}

impl Serialize for Delegator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Delegator", 4)?;
        state.serialize_field("address", &self.address)?;
        state.serialize_field("is_delegate", &self.is_delegate)?;
        state.serialize_field("commitments", &self.commitments)?;
        state.serialize_field("total_payout", &self.total_payout())?;
        state.end()
    }
}

/// Delegate's stake for one cycle and the part of it backed by complete rolls
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegateCycleState {
    pub cycle: Cycle,
    pub staking_balance: Amount,
    pub roll_capacity: Amount,
}

impl DelegateCycleState {
    /// `roll_quantum` must be positive; callers validate it through `PayoutParams`
    pub fn new(cycle: Cycle, staking_balance: Amount, roll_quantum: Amount) -> Self {
        let roll_capacity = if staking_balance <= Amount::ZERO {
            Amount::ZERO
        } else {
            (staking_balance / roll_quantum).floor() * roll_quantum
        };
        Self {
            cycle,
            staking_balance,
            roll_capacity,
        }
    }

    /// Stake above the last complete roll
    pub fn spillage(&self) -> Amount {
        self.staking_balance - self.roll_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_capacity_floors_to_quantum() {
        let state = DelegateCycleState::new(7, dec!(25000), DEFAULT_ROLL_QUANTUM);
        assert_eq!(state.roll_capacity, dec!(20000));
        assert_eq!(state.spillage(), dec!(5000));

        let exact = DelegateCycleState::new(7, dec!(30000), DEFAULT_ROLL_QUANTUM);
        assert_eq!(exact.roll_capacity, dec!(30000));
        assert_eq!(exact.spillage(), Amount::ZERO);

        let fractional = DelegateCycleState::new(7, dec!(19999.999999), DEFAULT_ROLL_QUANTUM);
        assert_eq!(fractional.roll_capacity, dec!(10000));
    }

    #[test]
    fn test_roll_capacity_below_one_roll() {
        let state = DelegateCycleState::new(1, dec!(9999), DEFAULT_ROLL_QUANTUM);
        assert_eq!(state.roll_capacity, Amount::ZERO);
        assert_eq!(state.spillage(), dec!(9999));

        let empty = DelegateCycleState::new(1, Amount::ZERO, DEFAULT_ROLL_QUANTUM);
        assert_eq!(empty.roll_capacity, Amount::ZERO);
    }

    #[test]
    fn test_record_replaces_same_cycle() {
        let mut delegator = Delegator::new(Address::from("tz1alice"));
        assert!(!delegator.record(Commitment::new(3, dec!(100))));
        assert!(!delegator.record(Commitment::new(4, dec!(200))));
        assert!(delegator.record(Commitment::new(3, dec!(150))));

        assert_eq!(delegator.commitments().len(), 2);
        assert_eq!(
            delegator.commitment_for(3).map(|c| c.staked_amount),
            Some(dec!(150))
        );
    }

    #[test]
    fn test_total_payout_sums_net() {
        let mut delegator = Delegator::new(Address::from("tz1bob"));
        let mut first = Commitment::new(1, dec!(10));
        first.net_payout = dec!(4.5);
        let mut second = Commitment::new(2, dec!(10));
        second.net_payout = dec!(5.5);
        delegator.record(first);
        delegator.record(second);

        assert_eq!(delegator.total_payout(), dec!(10));
    }

    #[test]
    fn test_serialized_total_tracks_commitments() {
        let mut delegator = Delegator::new(Address::from("tz1bob"));
        let mut first = Commitment::new(1, dec!(10));
        first.net_payout = dec!(4.5);
        delegator.record(first);

        let json = serde_json::to_value(&delegator).unwrap();
        assert_eq!(json["total_payout"], "4.5");

        // A replaced record changes the serialized total with no extra call.
        let mut replaced = Commitment::new(1, dec!(10));
        replaced.net_payout = dec!(6);
        delegator.record(replaced);
        let json = serde_json::to_value(&delegator).unwrap();
        assert_eq!(json["total_payout"], "6");

        let back: Delegator = serde_json::from_value(json).unwrap();
        assert_eq!(back, delegator);
    }

    #[test]
    fn test_address_display() {
        assert_eq!(Address::new("tz1xyz").to_string(), "tz1xyz");
        assert_eq!(Address::from("tz1xyz").as_str(), "tz1xyz");
    }
}
