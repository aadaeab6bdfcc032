//! # Core Domain Entities
//!
//! Defines the gossip-level entities that flow through the ordering core.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `NodeId`, `Timestamp`
//! - **Events**: `EventDescriptor`, `PlatformEvent`
//! - **Membership**: `Roster`, `RosterEntry`

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;

use crate::hashgraph::{AncientMode, FIRST_GENERATION};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte event hash, computed upstream by the hashing stage.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash(#[serde_as(as = "Bytes")] pub [u8; 32]);

impl Hash {
    /// Wrap raw hash bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// SHA-256 of arbitrary bytes.
    pub fn digest(data: &[u8]) -> Self {
        let out = Sha256::digest(data);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&out);
        Self(bytes)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({}..)", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

/// Unique identifier for a node in the network (roster position independent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node{}", self.0)
    }
}

/// Wall-clock instant in nanoseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const fn from_nanos(nanos: u64) -> Self {
        Self(nanos)
    }

    pub const fn as_nanos(&self) -> u64 {
        self.0
    }

    pub fn saturating_add_nanos(self, nanos: u64) -> Self {
        Self(self.0.saturating_add(nanos))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

// =============================================================================
// CLUSTER B: EVENTS
// =============================================================================

/// The identifying metadata of an event, as carried in a child's parent reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub hash: Hash,
    pub creator: NodeId,
    pub generation: u64,
    pub birth_round: u64,
}

impl EventDescriptor {
    /// The value compared against the event window thresholds.
    pub fn ancient_indicator(&self, mode: AncientMode) -> u64 {
        mode.select_indicator(self.generation, self.birth_round)
    }
}

/// A hashed, signature-verified gossip event.
///
/// Immutable once hashed. Transactions are opaque to the ordering core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformEvent {
    /// Hash of the event (computed upstream).
    pub hash: Hash,
    /// The node that created the event.
    pub creator: NodeId,
    /// `max(parent generations) + 1`, or `FIRST_GENERATION` without parents.
    pub generation: u64,
    /// The round stamped by the creator when the event was built.
    pub birth_round: u64,
    /// The creator's previous event.
    pub self_parent: Option<EventDescriptor>,
    /// An event by another creator.
    pub other_parent: Option<EventDescriptor>,
    /// Creator-claimed creation time.
    pub time_created: Timestamp,
    /// Opaque application payload.
    pub transactions: Vec<Vec<u8>>,
}

impl PlatformEvent {
    /// Build an event whose generation is derived from its parents and whose hash
    /// is the SHA-256 of its canonical fields.
    ///
    /// Production events arrive already hashed; this constructor is used by
    /// event creators and fixtures.
    pub fn new(
        creator: NodeId,
        self_parent: Option<EventDescriptor>,
        other_parent: Option<EventDescriptor>,
        birth_round: u64,
        time_created: Timestamp,
        transactions: Vec<Vec<u8>>,
    ) -> Self {
        let generation = expected_generation(self_parent.as_ref(), other_parent.as_ref());
        let mut event = Self {
            hash: Hash::default(),
            creator,
            generation,
            birth_round,
            self_parent,
            other_parent,
            time_created,
            transactions,
        };
        event.hash = event.compute_hash();
        event
    }

    /// Canonical SHA-256 over every field except the hash itself.
    pub fn compute_hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(self.creator.0.to_le_bytes());
        hasher.update(self.generation.to_le_bytes());
        hasher.update(self.birth_round.to_le_bytes());
        for parent in [&self.self_parent, &self.other_parent] {
            match parent {
                Some(p) => {
                    hasher.update([1u8]);
                    hasher.update(p.hash.0);
                    hasher.update(p.creator.0.to_le_bytes());
                    hasher.update(p.generation.to_le_bytes());
                    hasher.update(p.birth_round.to_le_bytes());
                }
                None => hasher.update([0u8]),
            }
        }
        hasher.update(self.time_created.0.to_le_bytes());
        for tx in &self.transactions {
            hasher.update((tx.len() as u64).to_le_bytes());
            hasher.update(tx);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&hasher.finalize());
        Hash(bytes)
    }

    pub fn descriptor(&self) -> EventDescriptor {
        EventDescriptor {
            hash: self.hash,
            creator: self.creator,
            generation: self.generation,
            birth_round: self.birth_round,
        }
    }

    /// Declared parents, self-parent first.
    pub fn parents(&self) -> impl Iterator<Item = &EventDescriptor> {
        self.self_parent.iter().chain(self.other_parent.iter())
    }

    pub fn ancient_indicator(&self, mode: AncientMode) -> u64 {
        mode.select_indicator(self.generation, self.birth_round)
    }
}

/// Generation an event must carry given its declared parents.
pub fn expected_generation(
    self_parent: Option<&EventDescriptor>,
    other_parent: Option<&EventDescriptor>,
) -> u64 {
    self_parent
        .into_iter()
        .chain(other_parent)
        .map(|p| p.generation + 1)
        .max()
        .unwrap_or(FIRST_GENERATION)
}

// =============================================================================
// CLUSTER C: MEMBERSHIP
// =============================================================================

/// A single voting member of the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub node_id: NodeId,
    pub weight: u64,
}

/// The effective validator set and weights for a round.
///
/// Only the entries go over the wire. Total weight and the lookup table are
/// always recomputed through [`Roster::new`] on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "RosterRepr", into = "RosterRepr")]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
    pub total_weight: u64,
    /// Quick lookup by node ID
    lookup: HashMap<NodeId, usize>,
}

/// Wire form of a [`Roster`].
#[derive(Serialize, Deserialize)]
struct RosterRepr {
    entries: Vec<RosterEntry>,
}

impl From<RosterRepr> for Roster {
    fn from(repr: RosterRepr) -> Self {
        Self::new(repr.entries)
    }
}

impl From<Roster> for RosterRepr {
    fn from(roster: Roster) -> Self {
        Self {
            entries: roster.entries,
        }
    }
}

impl Roster {
    pub fn new(entries: Vec<RosterEntry>) -> Self {
        let total_weight = entries.iter().map(|e| e.weight).sum();
        let lookup = entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.node_id, i))
            .collect();
        Self {
            entries,
            total_weight,
            lookup,
        }
    }

    /// A roster of `count` nodes (ids `0..count`) with equal weight.
    pub fn equal_weight(count: u64, weight: u64) -> Self {
        Self::new(
            (0..count)
                .map(|id| RosterEntry {
                    node_id: NodeId(id),
                    weight,
                })
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.lookup.contains_key(node_id)
    }

    /// Weight of a node, zero for nodes outside the roster.
    pub fn weight_of(&self, node_id: &NodeId) -> u64 {
        self.lookup
            .get(node_id)
            .map(|&idx| self.entries[idx].weight)
            .unwrap_or(0)
    }

    /// Strictly more than two thirds of total weight.
    pub fn is_supermajority(&self, weight: u64) -> bool {
        (weight as u128) * 3 > (self.total_weight as u128) * 2
    }
}

impl PartialEq for Roster {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Roster {}
