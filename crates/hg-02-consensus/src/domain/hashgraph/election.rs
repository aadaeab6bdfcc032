//! Fame election bookkeeping for the lowest undecided round.

use std::collections::HashMap;

use shared_types::PlatformEvent;

use super::node::EventIdx;

/// Votes cast about the witnesses of a single round.
#[derive(Debug, Default)]
pub(crate) struct Election {
    round: u64,
    /// voter -> candidate -> vote
    votes: HashMap<EventIdx, HashMap<EventIdx, bool>>,
}

impl Election {
    pub fn new(round: u64) -> Self {
        Self {
            round,
            votes: HashMap::new(),
        }
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    pub fn vote_of(&self, voter: EventIdx, candidate: EventIdx) -> Option<bool> {
        self.votes.get(&voter)?.get(&candidate).copied()
    }

    pub fn record(&mut self, voter: EventIdx, candidate: EventIdx, vote: bool) {
        self.votes.entry(voter).or_default().insert(candidate, vote);
    }

    /// Drop all votes and start the election of `round`.
    pub fn reset(&mut self, round: u64) {
        self.round = round;
        self.votes.clear();
    }
}

/// Weighted yes/no tally of the votes a voter strongly sees.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct Tally {
    yes: u64,
    no: u64,
}

impl Tally {
    pub fn add(&mut self, vote: bool, weight: u64) {
        if vote {
            self.yes += weight;
        } else {
            self.no += weight;
        }
    }

    /// Majority vote, ties count as yes.
    pub fn majority(&self) -> bool {
        self.yes >= self.no
    }

    /// Weight behind the majority vote.
    pub fn majority_weight(&self) -> u64 {
        self.yes.max(self.no)
    }
}

/// Pseudo-random vote used in coin rounds: a bit of the voter's hash.
pub(crate) fn coin(voter: &PlatformEvent) -> bool {
    voter.hash.as_bytes()[16] & 1 == 1
}
