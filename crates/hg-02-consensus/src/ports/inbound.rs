//! Driving ports (Inbound API)

use crate::domain::ConsensusResult;
use shared_types::{ConsensusRound, ConsensusSnapshot, EventWindow, PlatformEvent, PlatformStatus};

/// Primary Consensus Engine API
pub trait ConsensusEngineApi: Send {
    /// Add an event released by the orphan buffer
    ///
    /// Returns every round that reached consensus as a result, in increasing
    /// round order. An error is fatal.
    fn add_event(&mut self, event: PlatformEvent) -> ConsensusResult<Vec<ConsensusRound>>;

    /// Discard all in-memory state and resume from `snapshot`
    fn out_of_band_snapshot_update(&mut self, snapshot: ConsensusSnapshot) -> ConsensusResult<()>;

    /// React to a platform status change
    fn update_platform_status(&mut self, status: PlatformStatus);

    /// The window after the most recently decided round
    fn current_event_window(&self) -> EventWindow;
}
