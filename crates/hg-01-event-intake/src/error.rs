//! Error types for the Event Intake subsystem

use shared_types::AncientMode;
use thiserror::Error;

/// Errors that can occur in the Event Intake subsystem
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntakeError {
    #[error("Event window uses {actual:?}, buffer configured for {expected:?}")]
    AncientModeMismatch {
        expected: AncientMode,
        actual: AncientMode,
    },

    #[error("Invalid intake configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for intake operations
pub type IntakeResult<T> = Result<T, IntakeError>;
