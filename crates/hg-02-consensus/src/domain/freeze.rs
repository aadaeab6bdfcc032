//! # Freeze Round Controller
//!
//! Stops round production at the first round whose consensus time falls in
//! the freeze period, so every node halts at the same round before an
//! upgrade.

use std::sync::Arc;

use shared_types::ConsensusRound;
use tracing::info;

use crate::metrics;
use crate::ports::FreezeChecker;

pub struct FreezeRoundController {
    checker: Arc<dyn FreezeChecker>,
    frozen: bool,
}

impl FreezeRoundController {
    pub fn new(checker: Arc<dyn FreezeChecker>) -> Self {
        Self {
            checker,
            frozen: false,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Truncate `rounds` after the freeze round, if present.
    ///
    /// The freeze round's window is rewritten so that new events are born in
    /// the freeze round itself. Once frozen every later batch is discarded.
    pub fn filter_and_modify(&mut self, rounds: Vec<ConsensusRound>) -> Vec<ConsensusRound> {
        if self.frozen {
            return Vec::new();
        }

        let Some(freeze_index) = rounds
            .iter()
            .position(|r| self.checker.is_in_freeze_period(r.reached_consensus_timestamp()))
        else {
            return rounds;
        };

        let mut kept: Vec<ConsensusRound> = rounds.into_iter().take(freeze_index + 1).collect();
        if let Some(freeze_round) = kept.pop() {
            let window = freeze_round
                .event_window()
                .with_new_event_birth_round(freeze_round.round_number());
            info!(
                round = freeze_round.round_number(),
                consensus_time = %freeze_round.reached_consensus_timestamp(),
                "Freeze round reached"
            );
            kept.push(freeze_round.with_event_window(window));
        }

        self.frozen = true;
        metrics::record_freeze();
        kept
    }
}
