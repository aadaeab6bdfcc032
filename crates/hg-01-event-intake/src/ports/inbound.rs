//! Driving ports (Inbound API)

use crate::error::IntakeResult;
use shared_types::{EventWindow, PlatformEvent};

/// Primary Event Intake API
///
/// Implementations release events only once their parents have been released
/// or are known to be ancient, so downstream stages always observe parents
/// before children.
pub trait EventIntakeApi: Send {
    /// Submit an event, returning every event that became releasable.
    fn handle_event(&mut self, event: PlatformEvent) -> Vec<PlatformEvent>;

    /// Advance the event window, returning events unblocked by the change.
    fn set_event_window(&mut self, window: EventWindow) -> IntakeResult<Vec<PlatformEvent>>;

    /// Forget all buffered state.
    fn clear(&mut self);

    /// Number of events waiting for missing parents.
    fn current_orphan_count(&self) -> usize;
}
