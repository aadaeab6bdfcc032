//! Driven ports (Outbound dependencies)

use shared_types::{Roster, Timestamp};
use std::sync::Arc;

/// Source of the consensus roster.
///
/// The roster may only change at round boundaries; every call for the same
/// round must return the same roster.
pub trait RosterProvider: Send + Sync {
    /// Roster whose weights apply to witnesses of `round`
    fn roster_for_round(&self, round: u64) -> Arc<Roster>;
}

/// Decides whether a consensus time falls in the freeze period.
pub trait FreezeChecker: Send + Sync {
    fn is_in_freeze_period(&self, consensus_time: Timestamp) -> bool;
}
