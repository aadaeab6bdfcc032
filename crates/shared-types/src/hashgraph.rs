//! # Hashgraph Round-Level Types
//!
//! The values exchanged between the intake stages, the consensus core and
//! downstream consumers: the event window, finalized rounds and snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::entities::{EventDescriptor, Hash, PlatformEvent, Roster, Timestamp};
use crate::errors::{EventWindowError, SnapshotError};

/// Round number used before any round has reached consensus.
pub const ROUND_NEGATIVE_INFINITY: u64 = 0;

/// The first round of consensus.
pub const ROUND_FIRST: u64 = 1;

/// Generation of an event without parents.
pub const FIRST_GENERATION: u64 = 0;

// =============================================================================
// ANCIENT MODE
// =============================================================================

/// Selects which event field is authoritative for ancient-ness comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AncientMode {
    /// Ancient-ness is decided by event generation.
    GenerationThreshold,
    /// Ancient-ness is decided by event birth round.
    #[default]
    BirthRoundThreshold,
}

impl AncientMode {
    pub fn select_indicator(&self, generation: u64, birth_round: u64) -> u64 {
        match self {
            AncientMode::GenerationThreshold => generation,
            AncientMode::BirthRoundThreshold => birth_round,
        }
    }

    /// Lowest valid indicator value in this mode.
    pub fn first_indicator(&self) -> u64 {
        match self {
            AncientMode::GenerationThreshold => FIRST_GENERATION,
            AncientMode::BirthRoundThreshold => ROUND_FIRST,
        }
    }
}

// =============================================================================
// EVENT WINDOW
// =============================================================================

/// Describes which events are still relevant and which round was last finalized.
///
/// An event is ancient iff its indicator is below `ancient_threshold`, and
/// expired (forgotten everywhere) iff below `expired_threshold`. Expired events
/// are a subset of ancient events, so `expired_threshold <= ancient_threshold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventWindow {
    latest_consensus_round: u64,
    new_event_birth_round: u64,
    ancient_threshold: u64,
    expired_threshold: u64,
    ancient_mode: AncientMode,
}

impl EventWindow {
    pub fn new(
        latest_consensus_round: u64,
        new_event_birth_round: u64,
        ancient_threshold: u64,
        expired_threshold: u64,
        ancient_mode: AncientMode,
    ) -> Result<Self, EventWindowError> {
        if new_event_birth_round < ROUND_FIRST {
            return Err(EventWindowError::InvalidBirthRound(new_event_birth_round));
        }
        let first = ancient_mode.first_indicator();
        if ancient_threshold < first || expired_threshold < first {
            return Err(EventWindowError::ThresholdBelowFirst {
                threshold: ancient_threshold.min(expired_threshold),
                first,
            });
        }
        if expired_threshold > ancient_threshold {
            return Err(EventWindowError::ExpiredAboveAncient {
                expired: expired_threshold,
                ancient: ancient_threshold,
            });
        }
        Ok(Self {
            latest_consensus_round,
            new_event_birth_round,
            ancient_threshold,
            expired_threshold,
            ancient_mode,
        })
    }

    /// The window before any round has reached consensus.
    pub fn genesis(ancient_mode: AncientMode) -> Self {
        let first = ancient_mode.first_indicator();
        Self {
            latest_consensus_round: ROUND_NEGATIVE_INFINITY,
            new_event_birth_round: ROUND_FIRST,
            ancient_threshold: first,
            expired_threshold: first,
            ancient_mode,
        }
    }

    pub fn latest_consensus_round(&self) -> u64 {
        self.latest_consensus_round
    }

    pub fn new_event_birth_round(&self) -> u64 {
        self.new_event_birth_round
    }

    pub fn ancient_threshold(&self) -> u64 {
        self.ancient_threshold
    }

    pub fn expired_threshold(&self) -> u64 {
        self.expired_threshold
    }

    pub fn ancient_mode(&self) -> AncientMode {
        self.ancient_mode
    }

    pub fn is_genesis(&self) -> bool {
        self.latest_consensus_round == ROUND_NEGATIVE_INFINITY
    }

    /// The round that will come to consensus next.
    pub fn pending_consensus_round(&self) -> u64 {
        self.latest_consensus_round + 1
    }

    pub fn is_ancient_indicator(&self, indicator: u64) -> bool {
        indicator < self.ancient_threshold
    }

    pub fn is_expired_indicator(&self, indicator: u64) -> bool {
        indicator < self.expired_threshold
    }

    pub fn is_ancient(&self, event: &PlatformEvent) -> bool {
        self.is_ancient_indicator(event.ancient_indicator(self.ancient_mode))
    }

    pub fn is_descriptor_ancient(&self, descriptor: &EventDescriptor) -> bool {
        self.is_ancient_indicator(descriptor.ancient_indicator(self.ancient_mode))
    }

    /// Copy of this window with a different birth round for new events.
    pub fn with_new_event_birth_round(&self, new_event_birth_round: u64) -> Self {
        Self {
            new_event_birth_round: new_event_birth_round.max(ROUND_FIRST),
            ..*self
        }
    }
}

impl fmt::Display for EventWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EventWindow(latest={}, birth={}, ancient={}, expired={}, mode={:?})",
            self.latest_consensus_round,
            self.new_event_birth_round,
            self.ancient_threshold,
            self.expired_threshold,
            self.ancient_mode
        )
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// The lowest ancient indicator among the judges of a decided round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MinimumJudgeInfo {
    pub round: u64,
    pub minimum_judge_ancient_threshold: u64,
}

/// The minimal state required to resume consensus after restart or reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSnapshot {
    /// The last round that reached consensus.
    pub round: u64,
    /// Judges of `round`, the starting point for round creation.
    pub judge_hashes: Vec<Hash>,
    /// One entry per non-ancient decided round, ascending, ending at `round`.
    pub minimum_judge_info_list: Vec<MinimumJudgeInfo>,
    /// The consensus order number the next consensus event receives.
    pub next_consensus_number: u64,
    /// Consensus timestamp of the last event ordered before the snapshot.
    pub consensus_timestamp: Timestamp,
}

impl ConsensusSnapshot {
    /// Check the structural invariants a loadable snapshot must satisfy.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let Some(last) = self.minimum_judge_info_list.last() else {
            return Err(SnapshotError::MissingJudgeInfo);
        };
        if self.round < ROUND_FIRST {
            return Err(SnapshotError::InvalidRound(self.round));
        }
        if last.round != self.round {
            return Err(SnapshotError::RoundMismatch {
                snapshot: self.round,
                last_info: last.round,
            });
        }
        for pair in self.minimum_judge_info_list.windows(2) {
            if pair[1].round != pair[0].round + 1 {
                return Err(SnapshotError::NonContiguousRounds {
                    previous: pair[0].round,
                    next: pair[1].round,
                });
            }
        }
        Ok(())
    }

    pub fn minimum_judge_info(&self, round: u64) -> Option<&MinimumJudgeInfo> {
        self.minimum_judge_info_list.iter().find(|i| i.round == round)
    }
}

// =============================================================================
// CONSENSUS OUTPUT
// =============================================================================

/// An event together with the consensus data assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusEvent {
    pub event: Arc<PlatformEvent>,
    pub round_received: u64,
    pub consensus_timestamp: Timestamp,
    pub consensus_order: u64,
}

impl ConsensusEvent {
    pub fn hash(&self) -> Hash {
        self.event.hash
    }
}

/// A finalized round, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusRound {
    round_number: u64,
    consensus_roster: Arc<Roster>,
    consensus_events: Vec<ConsensusEvent>,
    event_window: EventWindow,
    snapshot: ConsensusSnapshot,
    is_pces_round: bool,
    reached_consensus_timestamp: Timestamp,
}

impl ConsensusRound {
    pub fn new(
        round_number: u64,
        consensus_roster: Arc<Roster>,
        consensus_events: Vec<ConsensusEvent>,
        event_window: EventWindow,
        snapshot: ConsensusSnapshot,
        is_pces_round: bool,
        reached_consensus_timestamp: Timestamp,
    ) -> Self {
        Self {
            round_number,
            consensus_roster,
            consensus_events,
            event_window,
            snapshot,
            is_pces_round,
            reached_consensus_timestamp,
        }
    }

    pub fn round_number(&self) -> u64 {
        self.round_number
    }

    pub fn consensus_roster(&self) -> &Arc<Roster> {
        &self.consensus_roster
    }

    pub fn consensus_events(&self) -> &[ConsensusEvent] {
        &self.consensus_events
    }

    pub fn event_window(&self) -> &EventWindow {
        &self.event_window
    }

    pub fn snapshot(&self) -> &ConsensusSnapshot {
        &self.snapshot
    }

    pub fn is_pces_round(&self) -> bool {
        self.is_pces_round
    }

    pub fn reached_consensus_timestamp(&self) -> Timestamp {
        self.reached_consensus_timestamp
    }

    pub fn is_empty(&self) -> bool {
        self.consensus_events.is_empty()
    }

    /// Copy of this round carrying a different event window.
    pub fn with_event_window(&self, event_window: EventWindow) -> Self {
        Self {
            event_window,
            ..self.clone()
        }
    }
}

// =============================================================================
// PLATFORM STATUS
// =============================================================================

/// Node-level status, as reported by the platform status machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformStatus {
    StartingUp,
    /// Re-processing pre-consensus events already validated before a restart.
    ReplayingEvents,
    Observing,
    Checking,
    Active,
    Behind,
    Freezing,
    FreezeComplete,
    ReconnectComplete,
    CatastrophicFailure,
}
