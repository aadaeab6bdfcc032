//! Consensus and pipeline configuration

use crate::domain::{ConsensusError, ConsensusResult};
use serde::{Deserialize, Serialize};
use shared_types::AncientMode;

/// Consensus configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Number of decided rounds whose events are still non-ancient
    pub rounds_non_ancient: u64,
    /// Number of decided rounds kept in memory before events expire
    pub rounds_expired: u64,
    /// Every `coin_freq`-th voting round is a coin round
    pub coin_freq: u64,
    /// Which event field decides ancient-ness
    pub ancient_mode: AncientMode,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            rounds_non_ancient: 26,
            rounds_expired: 500,
            coin_freq: 12,
            ancient_mode: AncientMode::BirthRoundThreshold,
        }
    }
}

impl ConsensusConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConsensusResult<()> {
        if self.rounds_non_ancient == 0 {
            return Err(ConsensusError::InvalidConfig(
                "rounds_non_ancient cannot be 0".into(),
            ));
        }

        // Expired events must be a subset of ancient events
        if self.rounds_expired < self.rounds_non_ancient {
            return Err(ConsensusError::InvalidConfig(format!(
                "rounds_expired ({}) must be >= rounds_non_ancient ({})",
                self.rounds_expired, self.rounds_non_ancient
            )));
        }

        if self.coin_freq < 2 {
            return Err(ConsensusError::InvalidConfig(
                "coin_freq must be at least 2".into(),
            ));
        }

        Ok(())
    }

    /// Builder-style method to set the ancient window
    pub fn with_rounds(mut self, rounds_non_ancient: u64, rounds_expired: u64) -> Self {
        self.rounds_non_ancient = rounds_non_ancient;
        self.rounds_expired = rounds_expired;
        self
    }

    /// Builder-style method to set the ancient mode
    pub fn with_ancient_mode(mut self, mode: AncientMode) -> Self {
        self.ancient_mode = mode;
        self
    }
}

/// Pipeline runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Capacity of the intake queue
    pub intake_capacity: usize,
    /// Capacity of the queue between orphan buffer and engine
    pub engine_capacity: usize,
    /// Capacity of the finalized-round output queue
    pub output_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intake_capacity: 1024,
            engine_capacity: 1024,
            output_capacity: 64,
        }
    }
}

impl PipelineConfig {
    /// Validate configuration
    pub fn validate(&self) -> ConsensusResult<()> {
        if self.intake_capacity == 0 || self.engine_capacity == 0 || self.output_capacity == 0 {
            return Err(ConsensusError::InvalidConfig(
                "pipeline queue capacities cannot be 0".into(),
            ));
        }
        Ok(())
    }
}
