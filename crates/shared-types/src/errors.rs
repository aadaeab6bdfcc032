//! # Error Types
//!
//! Errors raised while constructing the shared round-level values.

use thiserror::Error;

/// Invalid event window bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventWindowError {
    /// Birth round for new events below the first round.
    #[error("Invalid new event birth round: {0}")]
    InvalidBirthRound(u64),

    /// A threshold lower than the first indicator of the ancient mode.
    #[error("Threshold {threshold} below first indicator {first}")]
    ThresholdBelowFirst { threshold: u64, first: u64 },

    /// Expired events must be a subset of ancient events.
    #[error("Expired threshold {expired} above ancient threshold {ancient}")]
    ExpiredAboveAncient { expired: u64, ancient: u64 },
}

/// A snapshot that cannot be used to resume consensus.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("Snapshot has no minimum judge info")]
    MissingJudgeInfo,

    #[error("Invalid snapshot round: {0}")]
    InvalidRound(u64),

    #[error("Snapshot round {snapshot} does not match last judge info round {last_info}")]
    RoundMismatch { snapshot: u64, last_info: u64 },

    #[error("Judge info rounds not contiguous: {previous} followed by {next}")]
    NonContiguousRounds { previous: u64, next: u64 },

    #[error("Snapshot produced an invalid event window: {0}")]
    InvalidWindow(#[from] EventWindowError),
}
