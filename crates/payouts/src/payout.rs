//! Payout derivation for a single commitment

use crate::types::{Amount, Commitment};

/// Fill in gross payout, fee and net payout from the commitment's share.
///
/// The fee is always recorded. The delegate's own commitment keeps the full
/// gross amount as its net payout.
pub fn calculate_payout(
    commitment: Commitment,
    fee_rate: Amount,
    total_cycle_rewards: Amount,
    is_delegate: bool,
) -> Commitment {
    let gross_payout = commitment.share_percentage * total_cycle_rewards;
    let fee = fee_rate * gross_payout;
    let net_payout = if is_delegate {
        gross_payout
    } else {
        gross_payout - fee
    };

    Commitment {
        gross_payout,
        fee,
        net_payout,
        ..commitment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn half_share() -> Commitment {
        Commitment::new(3, dec!(50000)).with_share(dec!(0.5))
    }

    #[test]
    fn test_delegator_pays_fee() {
        let c = calculate_payout(half_share(), dec!(0.1), dec!(100000), false);
        assert_eq!(c.gross_payout, dec!(50000));
        assert_eq!(c.fee, dec!(5000));
        assert_eq!(c.net_payout, dec!(45000));
        assert_eq!(c.staked_amount, dec!(50000));
        assert_eq!(c.cycle, 3);
    }

    #[test]
    fn test_delegate_keeps_gross() {
        let c = calculate_payout(half_share(), dec!(0.1), dec!(100000), true);
        assert_eq!(c.gross_payout, dec!(50000));
        assert_eq!(c.fee, dec!(5000));
        assert_eq!(c.net_payout, dec!(50000));
    }

    #[test]
    fn test_zero_share_pays_nothing() {
        let c = calculate_payout(
            Commitment::new(3, dec!(4000)),
            dec!(0.25),
            dec!(100000),
            false,
        );
        assert_eq!(c.gross_payout, Amount::ZERO);
        assert_eq!(c.fee, Amount::ZERO);
        assert_eq!(c.net_payout, Amount::ZERO);
    }

    #[test]
    fn test_full_fee_rate() {
        let c = calculate_payout(half_share(), Amount::ONE, dec!(80), false);
        assert_eq!(c.gross_payout, dec!(40));
        assert_eq!(c.net_payout, Amount::ZERO);
    }
}
