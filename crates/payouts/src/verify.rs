use crate::types::{Amount, Cycle, Delegator};
use rust_decimal_macros::dec;

/// Default tolerance when checking that a cycle's shares sum to one
pub const SHARE_SUM_TOLERANCE: Amount = dec!(0.000000001);

/// Sum of share percentages recorded for `cycle`.
///
/// Delegators without a commitment for the cycle contribute nothing. With
/// spillage on the sum is one whenever the balances fill the roll capacity,
/// and below one only when they fall short of it. With spillage off each
/// share is a raw ratio against roll capacity: the sum is one for stake that
/// is an exact roll multiple and exceeds one when stake sits above the last
/// complete roll.
pub fn sum_shares<'a, I>(cycle: Cycle, delegators: I) -> Amount
where
    I: IntoIterator<Item = &'a Delegator>,
{
    delegators
        .into_iter()
        .filter_map(|d| d.commitment_for(cycle))
        .map(|c| c.share_percentage)
        .sum()
}

/// Whether the cycle's shares sum to one within `tolerance`.
pub fn shares_balanced<'a, I>(cycle: Cycle, delegators: I, tolerance: Amount) -> bool
where
    I: IntoIterator<Item = &'a Delegator>,
{
    (sum_shares(cycle, delegators) - Amount::ONE).abs() <= tolerance
}
