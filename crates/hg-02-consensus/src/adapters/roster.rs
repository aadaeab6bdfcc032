//! Roster provider adapters

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::Roster;

use crate::ports::RosterProvider;

/// The same roster for every round.
#[derive(Debug, Clone)]
pub struct StaticRosterProvider {
    roster: Arc<Roster>,
}

impl StaticRosterProvider {
    pub fn new(roster: Roster) -> Self {
        Self {
            roster: Arc::new(roster),
        }
    }
}

impl RosterProvider for StaticRosterProvider {
    fn roster_for_round(&self, _round: u64) -> Arc<Roster> {
        Arc::clone(&self.roster)
    }
}

/// Rosters that take effect from a given round onward.
///
/// A schedule entry must be added before any event of its first round is
/// processed, otherwise nodes could disagree on the weights of that round.
#[derive(Debug)]
pub struct ScheduledRosterProvider {
    schedule: RwLock<BTreeMap<u64, Arc<Roster>>>,
}

impl ScheduledRosterProvider {
    /// Start with `genesis` in effect from round 0.
    pub fn new(genesis: Roster) -> Self {
        let mut schedule = BTreeMap::new();
        schedule.insert(0, Arc::new(genesis));
        Self {
            schedule: RwLock::new(schedule),
        }
    }

    /// Use `roster` for `first_round` and every later round until the next entry.
    pub fn schedule(&self, first_round: u64, roster: Roster) {
        self.schedule.write().insert(first_round, Arc::new(roster));
    }
}

impl RosterProvider for ScheduledRosterProvider {
    fn roster_for_round(&self, round: u64) -> Arc<Roster> {
        let schedule = self.schedule.read();
        schedule
            .range(..=round)
            .next_back()
            .map(|(_, roster)| Arc::clone(roster))
            .unwrap_or_else(|| Arc::new(Roster::new(Vec::new())))
    }
}
