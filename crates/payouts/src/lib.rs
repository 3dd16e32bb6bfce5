//! Stakeshare Payouts: delegator reward distribution
//!
//! Computes per-cycle payouts for accounts delegating to a baker:
//! - Stake snapshot lookup through a [`SnapshotProvider`]
//! - Share allocation against complete-roll capacity with optional spillage cap
//! - Gross / fee / net payout derivation, the delegate exempt from its own fee
//! - Range processing with per-cycle failure attribution
//! - Final totals handed to a [`PayoutDispatcher`]

pub mod addresses;
pub mod aggregator;
pub mod allocation;
pub mod dispatch;
pub mod errors;
pub mod ledger;
pub mod params;
pub mod payout;
pub mod snapshot;
pub mod types;
pub mod verify;

pub use addresses::*;
pub use aggregator::*;
pub use allocation::*;
pub use dispatch::*;
pub use errors::*;
pub use ledger::*;
pub use params::*;
pub use payout::*;
pub use snapshot::*;
pub use types::*;
pub use verify::*;

/// Module version for API introspection
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
