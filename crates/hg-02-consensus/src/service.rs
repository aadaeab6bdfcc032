//! Consensus Engine - wires the event-ordering stages together
//!
//! # Architecture
//! - Future event buffer holds events born in rounds not yet pending
//! - In-order linker resolves parents and rejects malformed events
//! - Consensus core runs virtual voting and emits rounds
//! - Freeze controller truncates output at the freeze round
//!
//! Every decided round feeds its event window back into the buffer and the
//! linker before the next event is processed.

use std::collections::VecDeque;
use std::sync::Arc;

use shared_types::{ConsensusRound, ConsensusSnapshot, EventWindow, Hash, PlatformEvent, PlatformStatus};
use tracing::{debug, error, info, warn};

use crate::config::ConsensusConfig;
use crate::domain::{
    event_window_from_snapshot, ConsensusCore, ConsensusError, ConsensusResult,
    FreezeRoundController, FutureEventBuffer, InOrderLinker, LinkError,
};
use crate::metrics;
use crate::ports::{ConsensusEngineApi, FreezeChecker, RosterProvider};

/// External collaborators of the engine.
pub struct ConsensusDependencies {
    pub roster_provider: Arc<dyn RosterProvider>,
    pub freeze_checker: Arc<dyn FreezeChecker>,
}

/// Consensus Engine
pub struct ConsensusEngine {
    config: ConsensusConfig,
    future_buffer: FutureEventBuffer,
    linker: InOrderLinker,
    core: ConsensusCore,
    freeze: FreezeRoundController,
    /// Window of the last emitted round, thresholds must never go backwards
    last_window: EventWindow,
    status: PlatformStatus,
}

impl ConsensusEngine {
    /// Create an engine at genesis.
    pub fn new(config: ConsensusConfig, deps: ConsensusDependencies) -> ConsensusResult<Self> {
        config.validate()?;

        let window = EventWindow::genesis(config.ancient_mode);
        info!(
            rounds_non_ancient = config.rounds_non_ancient,
            rounds_expired = config.rounds_expired,
            coin_freq = config.coin_freq,
            ancient_mode = ?config.ancient_mode,
            "Consensus engine initialized"
        );

        Ok(Self {
            future_buffer: FutureEventBuffer::new(window),
            linker: InOrderLinker::new(window),
            core: ConsensusCore::new(config.clone(), deps.roster_provider),
            freeze: FreezeRoundController::new(deps.freeze_checker),
            last_window: window,
            status: PlatformStatus::StartingUp,
            config,
        })
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn status(&self) -> PlatformStatus {
        self.status
    }

    pub fn is_frozen(&self) -> bool {
        self.freeze.is_frozen()
    }

    /// Events waiting in the future buffer.
    pub fn future_event_count(&self) -> usize {
        self.future_buffer.len()
    }

    /// Round created of an event still held by the core.
    pub fn round_of(&self, hash: &Hash) -> Option<u64> {
        self.core.round_of(hash)
    }

    // === PIPELINE STEPS ===

    fn link_and_order(&mut self, event: PlatformEvent) -> ConsensusResult<Vec<ConsensusRound>> {
        let linked = match self.linker.link_event(event) {
            Ok(linked) => linked,
            Err(err) => {
                self.report_link_error(&err);
                return Ok(Vec::new());
            }
        };
        metrics::record_event_linked();
        self.core.add_event(linked)
    }

    fn report_link_error(&self, err: &LinkError) {
        metrics::record_link_dropped(err.reason());
        if err.is_fault() {
            metrics::record_parent_mismatch();
            warn!(error = %err, "Discarding malformed event");
        } else {
            debug!(error = %err, "Event not linked");
        }
    }

    /// Check the thresholds of a new round against the previous one and push
    /// the new window into the buffer and the linker.
    fn apply_round_window(&mut self, round: &ConsensusRound) -> ConsensusResult<Vec<PlatformEvent>> {
        let window = *round.event_window();
        let previous = self.last_window;

        if window.ancient_threshold() < previous.ancient_threshold() {
            error!(%previous, %window, "Ancient threshold went backwards");
            return Err(ConsensusError::AncientThresholdRegression {
                previous: previous.ancient_threshold(),
                next: window.ancient_threshold(),
            });
        }
        if window.expired_threshold() < previous.expired_threshold() {
            error!(%previous, %window, "Expired threshold went backwards");
            return Err(ConsensusError::ExpiredThresholdRegression {
                previous: previous.expired_threshold(),
                next: window.expired_threshold(),
            });
        }

        self.last_window = window;
        self.linker.set_event_window(window);
        let released = self.future_buffer.update_event_window(window);
        metrics::set_future_buffer_size(self.future_buffer.len());
        Ok(released)
    }
}

impl ConsensusEngineApi for ConsensusEngine {
    fn add_event(&mut self, event: PlatformEvent) -> ConsensusResult<Vec<ConsensusRound>> {
        if self.freeze.is_frozen() {
            debug!(hash = %event.hash, "Engine frozen, ignoring event");
            return Ok(Vec::new());
        }

        let mut queue: VecDeque<PlatformEvent> = VecDeque::new();
        if let Some(ready) = self.future_buffer.add_event(event) {
            queue.push_back(ready);
        }
        metrics::set_future_buffer_size(self.future_buffer.len());

        let mut rounds = Vec::new();
        while let Some(next) = queue.pop_front() {
            let decided = self.link_and_order(next)?;
            for round in &decided {
                queue.extend(self.apply_round_window(round)?);
            }
            rounds.extend(decided);
        }

        Ok(self.freeze.filter_and_modify(rounds))
    }

    fn out_of_band_snapshot_update(&mut self, snapshot: ConsensusSnapshot) -> ConsensusResult<()> {
        snapshot.validate()?;
        let window = event_window_from_snapshot(&snapshot, &self.config)?;

        self.linker.clear();
        self.linker.set_event_window(window);
        self.future_buffer.clear();
        // Nothing is pending after a clear, the release list is always empty
        let _ = self.future_buffer.update_event_window(window);
        self.core.load_snapshot(&snapshot)?;
        self.last_window = window;
        metrics::set_future_buffer_size(0);

        info!(round = snapshot.round, %window, "Engine reset from snapshot");
        Ok(())
    }

    fn update_platform_status(&mut self, status: PlatformStatus) {
        if status != self.status {
            debug!(from = ?self.status, to = ?status, "Platform status changed");
        }
        self.status = status;
        self.core.set_pces_mode(status == PlatformStatus::ReplayingEvents);
    }

    fn current_event_window(&self) -> EventWindow {
        *self.core.event_window()
    }
}
