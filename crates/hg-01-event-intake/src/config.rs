//! Orphan buffer configuration

use crate::error::{IntakeError, IntakeResult};
use serde::{Deserialize, Serialize};
use shared_types::AncientMode;

/// Event intake configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Which event field decides ancient-ness
    pub ancient_mode: AncientMode,
    /// Orphan count above which every new orphan is logged at warn level
    pub orphan_warning_threshold: usize,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            ancient_mode: AncientMode::BirthRoundThreshold,
            orphan_warning_threshold: 10_000,
        }
    }
}

impl IntakeConfig {
    /// Validate configuration
    pub fn validate(&self) -> IntakeResult<()> {
        if self.orphan_warning_threshold == 0 {
            return Err(IntakeError::InvalidConfig(
                "orphan_warning_threshold cannot be 0".into(),
            ));
        }
        Ok(())
    }

    /// Builder-style method to set the ancient mode
    pub fn with_ancient_mode(mut self, mode: AncientMode) -> Self {
        self.ancient_mode = mode;
        self
    }
}
