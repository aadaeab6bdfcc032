//! # In-Order Linker
//!
//! Resolves the parent descriptors of released events into the parent events
//! themselves. Events must arrive parents first (the orphan buffer guarantees
//! this), so a non-ancient parent that cannot be found was either never
//! valid or was forgotten by a snapshot load.

use std::collections::HashMap;
use std::sync::Arc;

use shared_types::{expected_generation, EventDescriptor, EventWindow, Hash, PlatformEvent};

use super::error::{LinkError, LinkResult};

/// An event whose parents have been resolved.
///
/// A parent is `None` when the event declares none, or when the declared
/// parent is ancient.
#[derive(Debug, Clone)]
pub struct LinkedEvent {
    pub event: Arc<PlatformEvent>,
    pub self_parent: Option<Arc<PlatformEvent>>,
    pub other_parent: Option<Arc<PlatformEvent>>,
}

impl LinkedEvent {
    pub fn hash(&self) -> Hash {
        self.event.hash
    }
}

/// Links events to their parents, in the order they are received.
#[derive(Debug)]
pub struct InOrderLinker {
    event_window: EventWindow,
    linked: HashMap<Hash, Arc<PlatformEvent>>,
}

impl InOrderLinker {
    pub fn new(event_window: EventWindow) -> Self {
        Self {
            event_window,
            linked: HashMap::new(),
        }
    }

    /// Link an event. Errors are either normal drops or faults, see
    /// [`LinkError::is_fault`].
    pub fn link_event(&mut self, event: PlatformEvent) -> LinkResult<LinkedEvent> {
        if self.event_window.is_ancient(&event) {
            return Err(LinkError::Ancient(event.hash));
        }
        if self.linked.contains_key(&event.hash) {
            return Err(LinkError::Duplicate(event.hash));
        }

        let expected =
            expected_generation(event.self_parent.as_ref(), event.other_parent.as_ref());
        if event.generation != expected {
            return Err(LinkError::InvalidGeneration {
                hash: event.hash,
                declared: event.generation,
                expected,
            });
        }

        let self_parent = match &event.self_parent {
            Some(declared) => {
                let parent = self.resolve(&event, declared)?;
                if let Some(p) = &parent {
                    if p.creator != event.creator {
                        return Err(LinkError::ParentMismatch {
                            child: event.hash,
                            parent: declared.hash,
                            field: "self-parent creator",
                        });
                    }
                }
                parent
            }
            None => None,
        };
        let other_parent = match &event.other_parent {
            Some(declared) => self.resolve(&event, declared)?,
            None => None,
        };

        let event = Arc::new(event);
        self.linked.insert(event.hash, Arc::clone(&event));

        Ok(LinkedEvent {
            event,
            self_parent,
            other_parent,
        })
    }

    fn resolve(
        &self,
        child: &PlatformEvent,
        declared: &EventDescriptor,
    ) -> LinkResult<Option<Arc<PlatformEvent>>> {
        if self.event_window.is_descriptor_ancient(declared) {
            return Ok(None);
        }

        let Some(parent) = self.linked.get(&declared.hash) else {
            return Err(LinkError::MissingParent {
                child: child.hash,
                parent: declared.hash,
            });
        };

        let field = if parent.creator != declared.creator {
            Some("creator")
        } else if parent.generation != declared.generation {
            Some("generation")
        } else if parent.birth_round != declared.birth_round {
            Some("birth round")
        } else {
            None
        };

        match field {
            Some(field) => Err(LinkError::ParentMismatch {
                child: child.hash,
                parent: declared.hash,
                field,
            }),
            None => Ok(Some(Arc::clone(parent))),
        }
    }

    /// Set the window; events below the expired threshold are forgotten.
    pub fn set_event_window(&mut self, window: EventWindow) {
        self.event_window = window;
        let mode = window.ancient_mode();
        self.linked
            .retain(|_, event| !window.is_expired_indicator(event.ancient_indicator(mode)));
    }

    pub fn event_window(&self) -> &EventWindow {
        &self.event_window
    }

    pub fn clear(&mut self) {
        self.linked.clear();
    }

    pub fn linked_event_count(&self) -> usize {
        self.linked.len()
    }
}
