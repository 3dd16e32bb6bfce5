//! Payout dispatch boundary
//!
//! The core only produces final amounts. Building, signing and submitting
//! transfers is the dispatcher's job.

use crate::errors::{PayoutError, Result};
use crate::ledger::ContractLedger;
use crate::types::{Address, Amount};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Transfer instruction for one delegator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalPayout {
    pub address: Address,
    pub total_payout: Amount,
}

/// Interface for issuing transfers.
pub trait PayoutDispatcher {
    fn send(&mut self, to: &Address, amount: Amount) -> anyhow::Result<()>;
}

/// Every delegator's total payout, in ledger order.
pub fn final_payouts(ledger: &ContractLedger) -> Vec<FinalPayout> {
    ledger
        .iter()
        .map(|d| FinalPayout {
            address: d.address.clone(),
            total_payout: d.total_payout(),
        })
        .collect()
}

/// Hand every positive total to `dispatcher`, stopping at the first failure.
///
/// Returns the total amount handed over.
pub fn dispatch_payouts(
    ledger: &ContractLedger,
    dispatcher: &mut dyn PayoutDispatcher,
) -> Result<Amount> {
    let mut dispatched = Amount::ZERO;
    let mut transfers = 0usize;

    for payout in final_payouts(ledger) {
        if payout.total_payout <= Amount::ZERO {
            debug!(target: "payouts", "Nothing to send to {}", payout.address);
            continue;
        }
        dispatcher
            .send(&payout.address, payout.total_payout)
            .map_err(|source| PayoutError::DispatchFailed {
                address: payout.address.clone(),
                source,
            })?;
        dispatched += payout.total_payout;
        transfers += 1;
    }

    info!(
        target: "payouts",
        "Dispatched {} across {} transfers", dispatched, transfers
    );
    Ok(dispatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Commitment, Delegator};
    use anyhow::anyhow;
    use rust_decimal_macros::dec;

    #[derive(Default)]
    struct MockDispatcher {
        sent: Vec<(Address, Amount)>,
        reject: Option<Address>,
    }

    impl PayoutDispatcher for MockDispatcher {
        fn send(&mut self, to: &Address, amount: Amount) -> anyhow::Result<()> {
            if self.reject.as_ref() == Some(to) {
                return Err(anyhow!("transfer rejected"));
            }
            self.sent.push((to.clone(), amount));
            Ok(())
        }
    }

    fn paid(name: &str, nets: &[Amount]) -> Delegator {
        let mut d = Delegator::new(Address::from(name));
        for (i, net) in nets.iter().enumerate() {
            let mut c = Commitment::new(i as u64, Amount::ZERO);
            c.net_payout = *net;
            d.record(c);
        }
        d
    }

    fn ledger() -> ContractLedger {
        let mut ledger = ContractLedger::new();
        ledger.push(paid("a", &[dec!(10), dec!(5)]));
        ledger.push(paid("b", &[Amount::ZERO]));
        ledger.push(paid("c", &[dec!(2.5)]));
        ledger
    }

    #[test]
    fn test_final_payouts() {
        let payouts = final_payouts(&ledger());
        assert_eq!(payouts.len(), 3);
        assert_eq!(payouts[0].total_payout, dec!(15));
        assert_eq!(payouts[1].total_payout, Amount::ZERO);
        assert_eq!(payouts[2].address, Address::from("c"));
    }

    #[test]
    fn test_repeated_push_is_paid_once() {
        let mut ledger = ledger();
        assert!(!ledger.push(paid("a", &[dec!(10), dec!(5)])));

        let mut dispatcher = MockDispatcher::default();
        let total = dispatch_payouts(&ledger, &mut dispatcher).unwrap();
        assert_eq!(total, dec!(17.5));
        let to_a = dispatcher
            .sent
            .iter()
            .filter(|(to, _)| to == &Address::from("a"))
            .count();
        assert_eq!(to_a, 1);
    }

    #[test]
    fn test_dispatch_skips_zero_totals() {
        let mut dispatcher = MockDispatcher::default();
        let total = dispatch_payouts(&ledger(), &mut dispatcher).unwrap();
        assert_eq!(total, dec!(17.5));
        assert_eq!(
            dispatcher.sent,
            vec![(Address::from("a"), dec!(15)), (Address::from("c"), dec!(2.5))]
        );
    }

    #[test]
    fn test_dispatch_stops_on_failure() {
        let mut dispatcher = MockDispatcher {
            reject: Some(Address::from("a")),
            ..Default::default()
        };
        let err = dispatch_payouts(&ledger(), &mut dispatcher).unwrap_err();
        assert!(matches!(
            err,
            PayoutError::DispatchFailed { ref address, .. } if address == &Address::from("a")
        ));
        assert!(dispatcher.sent.is_empty());
    }
}
