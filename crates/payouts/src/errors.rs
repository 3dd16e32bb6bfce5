use crate::types::{Address, Cycle};
use thiserror::Error;

/// Errors raised while computing or dispatching delegator payouts.
#[derive(Debug, Error)]
pub enum PayoutError {
    #[error("snapshot unavailable {}: {call} failed: {source}", describe_cycle(.cycle))]
    SnapshotUnavailable {
        cycle: Option<Cycle>,
        call: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("no delegated contracts {}", describe_cycle(.cycle))]
    NoDelegatedContracts { cycle: Option<Cycle> },

    #[error("cycle range {start}-{end} aborted at cycle {cycle}: {source}")]
    CycleRangeAborted {
        start: Cycle,
        end: Cycle,
        cycle: Cycle,
        #[source]
        source: Box<PayoutError>,
    },

    #[error("invalid payout parameter: {0}")]
    InvalidParameter(String),

    #[error("address pattern failed to compile: {0}")]
    AddressPattern(#[from] regex::Error),

    #[error("payout dispatch to {address} failed: {source}")]
    DispatchFailed {
        address: Address,
        #[source]
        source: anyhow::Error,
    },
}

fn describe_cycle(cycle: &Option<Cycle>) -> String {
    match cycle {
        Some(c) => format!("for cycle {c}"),
        None => "at head".to_string(),
    }
}

impl PayoutError {
    pub(crate) fn snapshot(cycle: Cycle, call: &'static str, source: anyhow::Error) -> Self {
        Self::SnapshotUnavailable {
            cycle: Some(cycle),
            call,
            source,
        }
    }

    /// Cycle whose computation failed, looking through range wrappers
    pub fn failed_cycle(&self) -> Option<Cycle> {
        match self {
            Self::SnapshotUnavailable { cycle, .. } => *cycle,
            Self::NoDelegatedContracts { cycle } => *cycle,
            Self::CycleRangeAborted { cycle, .. } => Some(*cycle),
            _ => None,
        }
    }
}

/// Convenience result type for payout operations.
pub type Result<T> = std::result::Result<T, PayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let inner = PayoutError::snapshot(
            12,
            "account_balance_at_snapshot",
            anyhow::anyhow!("connection refused"),
        );
        assert_eq!(
            inner.to_string(),
            concat!(
                "snapshot unavailable for cycle 12: ",
                "account_balance_at_snapshot failed: connection refused"
            )
        );

        let wrapped = PayoutError::CycleRangeAborted {
            start: 10,
            end: 14,
            cycle: 12,
            source: Box::new(inner),
        };
        assert!(wrapped.to_string().starts_with("cycle range 10-14 aborted at cycle 12"));
        assert_eq!(wrapped.failed_cycle(), Some(12));
    }

    #[test]
    fn test_no_contracts_message() {
        let at_cycle = PayoutError::NoDelegatedContracts { cycle: Some(5) };
        assert_eq!(at_cycle.to_string(), "no delegated contracts for cycle 5");

        let at_head = PayoutError::NoDelegatedContracts { cycle: None };
        assert_eq!(at_head.to_string(), "no delegated contracts at head");
        assert_eq!(at_head.failed_cycle(), None);
    }
}
