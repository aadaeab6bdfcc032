//! Event window derivation from per-round minimum judge indicators.

use std::collections::VecDeque;

use shared_types::{ConsensusSnapshot, EventWindow, MinimumJudgeInfo, ROUND_FIRST};

use crate::config::ConsensusConfig;
use crate::domain::error::{ConsensusError, ConsensusResult};

/// Minimum judge indicators of the most recent decided rounds, oldest first.
#[derive(Debug, Clone, Default)]
pub(crate) struct JudgeInfoHistory {
    infos: VecDeque<MinimumJudgeInfo>,
    capacity: usize,
}

impl JudgeInfoHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            infos: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn from_snapshot(snapshot: &ConsensusSnapshot, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        history.infos.extend(snapshot.minimum_judge_info_list.iter().copied());
        history.trim();
        history
    }

    pub fn push(&mut self, info: MinimumJudgeInfo) -> ConsensusResult<()> {
        if let Some(last) = self.infos.back() {
            if info.round != last.round + 1 {
                return Err(ConsensusError::RoundRegression {
                    expected: last.round + 1,
                    actual: info.round,
                });
            }
        }
        self.infos.push_back(info);
        self.trim();
        Ok(())
    }

    fn trim(&mut self) {
        while self.infos.len() > self.capacity {
            self.infos.pop_front();
        }
    }

    /// Threshold of `round`, or of the oldest known round if `round` is older.
    pub fn threshold_at(&self, round: u64) -> Option<u64> {
        let first = self.infos.front()?;
        let round = round.max(first.round);
        self.infos
            .iter()
            .find(|info| info.round == round)
            .map(|info| info.minimum_judge_ancient_threshold)
    }

    /// The most recent `count` entries, oldest first.
    pub fn latest(&self, count: u64) -> Vec<MinimumJudgeInfo> {
        let skip = self.infos.len().saturating_sub(count as usize);
        self.infos.iter().skip(skip).copied().collect()
    }
}

/// The window after `latest_round` was decided, before monotonic clamping.
pub(crate) fn window_for_round(
    history: &JudgeInfoHistory,
    latest_round: u64,
    config: &ConsensusConfig,
) -> ConsensusResult<EventWindow> {
    let first = config.ancient_mode.first_indicator();
    let ancient = history
        .threshold_at(oldest_round(latest_round, config.rounds_non_ancient))
        .unwrap_or(first)
        .max(first);
    let expired = history
        .threshold_at(oldest_round(latest_round, config.rounds_expired))
        .unwrap_or(first)
        .max(first)
        .min(ancient);

    Ok(EventWindow::new(
        latest_round,
        latest_round.max(ROUND_FIRST),
        ancient,
        expired,
        config.ancient_mode,
    )?)
}

/// Oldest round inside a window of `rounds` rounds ending at `latest_round`.
fn oldest_round(latest_round: u64, rounds: u64) -> u64 {
    (latest_round + 1).saturating_sub(rounds).max(ROUND_FIRST)
}

/// Recompute the event window a snapshot implies.
pub fn event_window_from_snapshot(
    snapshot: &ConsensusSnapshot,
    config: &ConsensusConfig,
) -> ConsensusResult<EventWindow> {
    snapshot.validate()?;
    let history = JudgeInfoHistory::from_snapshot(snapshot, config.rounds_expired as usize);
    window_for_round(&history, snapshot.round, config)
}
