//! Error types for the Consensus subsystem

use shared_types::{EventWindowError, Hash, SnapshotError};

/// Fatal consensus errors.
///
/// Any of these means the node's view of the hashgraph can no longer be
/// trusted; the caller must stop processing and restart from a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConsensusError {
    #[error("Round regression: expected round {expected}, got {actual}")]
    RoundRegression { expected: u64, actual: u64 },

    #[error("Ancient threshold regressed from {previous} to {next}")]
    AncientThresholdRegression { previous: u64, next: u64 },

    #[error("Expired threshold regressed from {previous} to {next}")]
    ExpiredThresholdRegression { previous: u64, next: u64 },

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),

    #[error("Invalid event window: {0}")]
    InvalidWindow(#[from] EventWindowError),

    #[error("Invalid consensus configuration: {0}")]
    InvalidConfig(String),

    #[error("Corrupt hashgraph state: {0}")]
    CorruptState(String),
}

/// Result type for consensus operations
pub type ConsensusResult<T> = Result<T, ConsensusError>;

/// Reasons the linker refuses an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("Event {0} is ancient")]
    Ancient(Hash),

    #[error("Event {0} already linked")]
    Duplicate(Hash),

    #[error("Event {child} references unknown non-ancient parent {parent}")]
    MissingParent { child: Hash, parent: Hash },

    #[error("Event {child} declares parent {parent} with mismatched {field}")]
    ParentMismatch {
        child: Hash,
        parent: Hash,
        field: &'static str,
    },

    #[error("Event {hash} has generation {declared}, parents imply {expected}")]
    InvalidGeneration {
        hash: Hash,
        declared: u64,
        expected: u64,
    },
}

impl LinkError {
    /// Whether the event was malformed, as opposed to merely stale or unlinkable.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            LinkError::ParentMismatch { .. } | LinkError::InvalidGeneration { .. }
        )
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            LinkError::Ancient(_) => "ancient",
            LinkError::Duplicate(_) => "duplicate",
            LinkError::MissingParent { .. } => "missing_parent",
            LinkError::ParentMismatch { .. } => "parent_mismatch",
            LinkError::InvalidGeneration { .. } => "invalid_generation",
        }
    }
}

/// Result type for linking
pub type LinkResult<T> = Result<T, LinkError>;
