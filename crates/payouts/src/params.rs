use crate::errors::{PayoutError, Result};
use crate::types::{Amount, DEFAULT_ROLL_QUANTUM};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Delegate-chosen payout policy.
///
/// Loaded from operator configuration; call [`PayoutParams::validate`] before
/// handing it to the aggregator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayoutParams {
    /// Delegation fee as a fraction of gross payout (0.0 – 1.0)
    pub fee_rate: Amount,
    /// Hard-cap shares at complete rolls; overflow stake earns nothing
    pub spillage: bool,
    /// Stake represented by one roll
    pub roll_quantum: Amount,
}

impl Default for PayoutParams {
    fn default() -> Self {
        Self {
            fee_rate: dec!(0.10),
            spillage: true,
            roll_quantum: DEFAULT_ROLL_QUANTUM,
        }
    }
}

impl PayoutParams {
    pub fn new(fee_rate: Amount, spillage: bool) -> Self {
        Self {
            fee_rate,
            spillage,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fee_rate < Amount::ZERO || self.fee_rate > Amount::ONE {
            return Err(PayoutError::InvalidParameter(format!(
                "fee_rate must be between 0 and 1, got {}",
                self.fee_rate
            )));
        }
        if self.roll_quantum <= Amount::ZERO {
            return Err(PayoutError::InvalidParameter(format!(
                "roll_quantum must be positive, got {}",
                self.roll_quantum
            )));
        }
        Ok(())
    }
}
