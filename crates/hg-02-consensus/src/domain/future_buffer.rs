//! # Future Event Buffer
//!
//! In birth-round mode an event may be created by a node that is ahead of
//! this one. Such events are held until this node's pending consensus round
//! catches up with their birth round.

use std::collections::BTreeMap;

use shared_types::{AncientMode, EventWindow, PlatformEvent};
use tracing::debug;

/// Holds events whose birth round is beyond the pending consensus round.
#[derive(Debug)]
pub struct FutureEventBuffer {
    event_window: EventWindow,
    pending: BTreeMap<u64, Vec<PlatformEvent>>,
    size: usize,
}

impl FutureEventBuffer {
    pub fn new(event_window: EventWindow) -> Self {
        Self {
            event_window,
            pending: BTreeMap::new(),
            size: 0,
        }
    }

    /// Returns the event if it can be processed now, `None` if it was
    /// buffered or dropped as ancient.
    pub fn add_event(&mut self, event: PlatformEvent) -> Option<PlatformEvent> {
        if self.event_window.is_ancient(&event) {
            debug!(hash = %event.hash, "Future buffer dropping ancient event");
            return None;
        }
        if !self.is_from_future(&event) {
            return Some(event);
        }

        debug!(
            hash = %event.hash,
            birth_round = event.birth_round,
            pending_round = self.event_window.pending_consensus_round(),
            "Buffering event from a future round"
        );
        self.pending.entry(event.birth_round).or_default().push(event);
        self.size += 1;
        None
    }

    /// Set the window and return buffered events that are no longer from the
    /// future, lowest birth round first.
    pub fn update_event_window(&mut self, window: EventWindow) -> Vec<PlatformEvent> {
        self.event_window = window;

        let still_future = self.pending.split_off(&(window.pending_consensus_round() + 1));
        let ready = std::mem::replace(&mut self.pending, still_future);

        let released: Vec<PlatformEvent> = ready
            .into_values()
            .flatten()
            .filter(|event| !window.is_ancient(event))
            .collect();
        self.size = self.pending.values().map(Vec::len).sum();
        released
    }

    fn is_from_future(&self, event: &PlatformEvent) -> bool {
        self.event_window.ancient_mode() == AncientMode::BirthRoundThreshold
            && event.birth_round > self.event_window.pending_consensus_round()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.size = 0;
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
