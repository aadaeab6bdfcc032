//! Arena nodes holding the per-event consensus metadata.

use std::sync::Arc;

use shared_types::{PlatformEvent, Timestamp};

/// Position of an event in the consensus arena. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct EventIdx(pub(crate) u64);

/// The latest event of one creator among another event's ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SeenRef {
    pub idx: EventIdx,
    pub generation: u64,
}

#[derive(Debug)]
pub(crate) struct EventNode {
    pub event: Arc<PlatformEvent>,
    pub creator_index: usize,
    pub self_parent: Option<EventIdx>,
    pub other_parent: Option<EventIdx>,
    pub round: u64,
    pub is_witness: bool,
    /// Only meaningful for witnesses; `None` while undecided
    pub fame: Option<bool>,
    pub is_judge: bool,
    /// Indexed by creator index
    pub last_see: Vec<Option<SeenRef>>,
    pub round_received: Option<u64>,
}

impl EventNode {
    pub fn last_see(&self, creator_index: usize) -> Option<SeenRef> {
        self.last_see.get(creator_index).copied().flatten()
    }

    /// Whether `target` is an ancestor of this event (or the event itself).
    pub fn sees(&self, target: &EventNode) -> bool {
        self.last_see(target.creator_index)
            .is_some_and(|seen| seen.generation >= target.event.generation)
    }

    pub fn parents(&self) -> impl Iterator<Item = EventIdx> {
        self.self_parent.into_iter().chain(self.other_parent)
    }

    pub fn time_created(&self) -> Timestamp {
        self.event.time_created
    }
}
