//! Freeze checker adapters

use shared_types::Timestamp;

use crate::ports::FreezeChecker;

/// A node that is never scheduled to freeze.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFreeze;

impl FreezeChecker for NeverFreeze {
    fn is_in_freeze_period(&self, _consensus_time: Timestamp) -> bool {
        false
    }
}

/// Freeze at the first round whose consensus time reaches `freeze_time`.
#[derive(Debug, Clone, Copy)]
pub struct FreezeAt {
    freeze_time: Timestamp,
}

impl FreezeAt {
    pub fn new(freeze_time: Timestamp) -> Self {
        Self { freeze_time }
    }
}

impl FreezeChecker for FreezeAt {
    fn is_in_freeze_period(&self, consensus_time: Timestamp) -> bool {
        consensus_time >= self.freeze_time
    }
}
