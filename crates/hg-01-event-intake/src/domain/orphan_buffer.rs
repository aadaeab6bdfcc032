//! # Orphan Buffer
//!
//! Holds events until every parent has either been released or become
//! ancient. Released events leave the buffer in topological order, so every
//! downstream stage sees a parent before any of its children.
//!
//! ```text
//! handle_event(e) ──► ancient? ──yes──► drop
//!                        │ no
//!                        ▼
//!                 parents available? ──no──► orphans + missing_parents
//!                        │ yes                         ▲
//!                        ▼                             │ parent released
//!                   release (BFS over waiting children)┘ or became ancient
//! ```

use std::collections::{HashMap, HashSet, VecDeque};

use shared_types::{AncientMode, EventDescriptor, EventWindow, Hash, PlatformEvent};
use tracing::{debug, warn};

use crate::config::IntakeConfig;
use crate::error::{IntakeError, IntakeResult};
use crate::metrics;
use crate::ports::EventIntakeApi;

/// An event waiting for at least one parent.
#[derive(Debug)]
struct Orphan {
    event: PlatformEvent,
    missing: HashSet<Hash>,
}

/// A parent that some orphans are waiting for.
#[derive(Debug)]
struct MissingParent {
    descriptor: EventDescriptor,
    children: Vec<Hash>,
}

/// Buffers events whose parents have not been observed yet.
#[derive(Debug)]
pub struct OrphanBuffer {
    config: IntakeConfig,
    event_window: EventWindow,
    /// Released, non-ancient events and their ancient indicators
    released: HashMap<Hash, u64>,
    orphans: HashMap<Hash, Orphan>,
    missing_parents: HashMap<Hash, MissingParent>,
}

impl OrphanBuffer {
    pub fn new(config: IntakeConfig) -> Self {
        let event_window = EventWindow::genesis(config.ancient_mode);
        Self {
            config,
            event_window,
            released: HashMap::new(),
            orphans: HashMap::new(),
            missing_parents: HashMap::new(),
        }
    }

    pub fn event_window(&self) -> &EventWindow {
        &self.event_window
    }

    fn ancient_mode(&self) -> AncientMode {
        self.config.ancient_mode
    }

    /// Submit an event and collect everything it makes releasable.
    pub fn handle_event(&mut self, event: PlatformEvent) -> Vec<PlatformEvent> {
        metrics::record_event_received();

        if self.event_window.is_ancient(&event) {
            debug!(hash = %event.hash, creator = %event.creator, "Dropping ancient event");
            metrics::record_event_dropped("ancient");
            return Vec::new();
        }

        if self.released.contains_key(&event.hash) || self.orphans.contains_key(&event.hash) {
            debug!(hash = %event.hash, "Dropping duplicate event");
            metrics::record_event_dropped("duplicate");
            return Vec::new();
        }

        let mut missing: Vec<EventDescriptor> = Vec::with_capacity(2);
        for parent in event.parents() {
            if !self.is_parent_available(parent) && !missing.iter().any(|m| m.hash == parent.hash)
            {
                missing.push(*parent);
            }
        }

        if missing.is_empty() {
            let mut released = Vec::new();
            self.release(event, &mut released);
            metrics::record_events_released(released.len());
            metrics::set_orphan_count(self.orphans.len());
            return released;
        }

        for parent in &missing {
            self.missing_parents
                .entry(parent.hash)
                .or_insert_with(|| MissingParent {
                    descriptor: *parent,
                    children: Vec::new(),
                })
                .children
                .push(event.hash);
        }

        debug!(
            hash = %event.hash,
            missing = missing.len(),
            "Buffering orphan"
        );
        self.orphans.insert(
            event.hash,
            Orphan {
                event,
                missing: missing.iter().map(|p| p.hash).collect(),
            },
        );

        if self.orphans.len() > self.config.orphan_warning_threshold {
            warn!(
                orphans = self.orphans.len(),
                threshold = self.config.orphan_warning_threshold,
                "Orphan buffer above warning threshold"
            );
        }
        metrics::set_orphan_count(self.orphans.len());

        Vec::new()
    }

    /// Advance the window. Orphans that became ancient are dropped and
    /// parents that became ancient are treated as provably missing.
    pub fn set_event_window(&mut self, window: EventWindow) -> IntakeResult<Vec<PlatformEvent>> {
        if window.ancient_mode() != self.ancient_mode() {
            return Err(IntakeError::AncientModeMismatch {
                expected: self.ancient_mode(),
                actual: window.ancient_mode(),
            });
        }
        self.event_window = window;

        self.released
            .retain(|_, indicator| !window.is_ancient_indicator(*indicator));

        let ancient_orphans: Vec<Hash> = self
            .orphans
            .iter()
            .filter(|(_, orphan)| window.is_ancient(&orphan.event))
            .map(|(hash, _)| *hash)
            .collect();
        for hash in &ancient_orphans {
            self.orphans.remove(hash);
            metrics::record_event_dropped("ancient");
        }
        if !ancient_orphans.is_empty() {
            debug!(dropped = ancient_orphans.len(), "Dropped orphans that became ancient");
        }

        let orphans = &self.orphans;
        self.missing_parents.retain(|_, missing| {
            missing.children.retain(|child| orphans.contains_key(child));
            !missing.children.is_empty()
        });

        let mode = self.ancient_mode();
        let mut now_ancient: Vec<EventDescriptor> = self
            .missing_parents
            .values()
            .filter(|missing| window.is_descriptor_ancient(&missing.descriptor))
            .map(|missing| missing.descriptor)
            .collect();
        now_ancient.sort_by_key(|d| (d.ancient_indicator(mode), d.hash));

        let mut released = Vec::new();
        for parent in now_ancient {
            let Some(missing) = self.missing_parents.remove(&parent.hash) else {
                continue;
            };
            for child in missing.children {
                if let Some(event) = self.resolve_parent(&child, &parent.hash) {
                    self.release(event, &mut released);
                }
            }
        }

        metrics::record_events_released(released.len());
        metrics::set_orphan_count(self.orphans.len());
        Ok(released)
    }

    /// Forget all buffered and released events.
    pub fn clear(&mut self) {
        self.released.clear();
        self.orphans.clear();
        self.missing_parents.clear();
        metrics::set_orphan_count(0);
    }

    pub fn current_orphan_count(&self) -> usize {
        self.orphans.len()
    }

    fn is_parent_available(&self, parent: &EventDescriptor) -> bool {
        self.event_window.is_descriptor_ancient(parent) || self.released.contains_key(&parent.hash)
    }

    /// Release `event` and, breadth first, every orphan it unblocks.
    fn release(&mut self, event: PlatformEvent, out: &mut Vec<PlatformEvent>) {
        let mode = self.ancient_mode();
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            self.released
                .insert(event.hash, event.ancient_indicator(mode));
            if let Some(missing) = self.missing_parents.remove(&event.hash) {
                for child in missing.children {
                    if let Some(unblocked) = self.resolve_parent(&child, &event.hash) {
                        queue.push_back(unblocked);
                    }
                }
            }
            out.push(event);
        }
    }

    /// Mark `parent` as no longer missing for `child`, returning the child
    /// once it has nothing left to wait for.
    fn resolve_parent(&mut self, child: &Hash, parent: &Hash) -> Option<PlatformEvent> {
        let orphan = self.orphans.get_mut(child)?;
        orphan.missing.remove(parent);
        if orphan.missing.is_empty() {
            self.orphans.remove(child).map(|orphan| orphan.event)
        } else {
            None
        }
    }
}

impl EventIntakeApi for OrphanBuffer {
    fn handle_event(&mut self, event: PlatformEvent) -> Vec<PlatformEvent> {
        OrphanBuffer::handle_event(self, event)
    }

    fn set_event_window(&mut self, window: EventWindow) -> IntakeResult<Vec<PlatformEvent>> {
        OrphanBuffer::set_event_window(self, window)
    }

    fn clear(&mut self) {
        OrphanBuffer::clear(self)
    }

    fn current_orphan_count(&self) -> usize {
        OrphanBuffer::current_orphan_count(self)
    }
}
