//! # hg-02-consensus
//!
//! Consensus subsystem: turns a stream of parent-ordered events into a
//! totally ordered sequence of consensus rounds.
//!
//! ## Architecture
//!
//! Events released by the orphan buffer pass through four stages:
//!
//! ```text
//! [Orphan Buffer] ──→ [Future Buffer] ──→ [Linker] ──→ [Hashgraph Core] ──→ [Freeze] ──→ rounds
//!        ▲                   ▲                ▲               │
//!        └───────────────────┴────────────────┴─ EventWindow ─┘
//! ```
//!
//! - **Future buffer**: holds events whose birth round is beyond the
//!   pending round (birth-round mode only).
//! - **Linker**: resolves parent descriptors, drops ancient and duplicate
//!   events, and rejects events whose declared parent metadata is wrong.
//! - **Hashgraph core**: assigns rounds, elects famous witnesses by virtual
//!   voting, and orders events once a round is decided.
//! - **Freeze controller**: stops output at the freeze round.
//!
//! Each decided round carries the new [`shared_types::EventWindow`], which
//! is applied to every stage before the next event is processed.
//!
//! ## Determinism
//!
//! Two nodes that receive the same set of events, in any parents-first
//! order, emit the same rounds with the same events, consensus order and
//! timestamps.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hg_02_consensus::{ConsensusConfig, ConsensusDependencies, ConsensusEngine};
//! use hg_02_consensus::adapters::{NeverFreeze, StaticRosterProvider};
//! use hg_02_consensus::ports::ConsensusEngineApi;
//!
//! let mut engine = ConsensusEngine::new(
//!     ConsensusConfig::default(),
//!     ConsensusDependencies {
//!         roster_provider: Arc::new(StaticRosterProvider::new(roster)),
//!         freeze_checker: Arc::new(NeverFreeze),
//!     },
//! )?;
//!
//! for round in engine.add_event(event)? {
//!     handle_round(round);
//! }
//! ```
//!
//! For an asynchronous node, [`spawn_pipeline`] runs the orphan buffer and
//! the engine as tokio tasks.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod pipeline;
pub mod ports;
pub mod service;

// Re-export main types
pub use config::{ConsensusConfig, PipelineConfig};
pub use domain::{
    event_window_from_snapshot, ConsensusCore, ConsensusError, ConsensusResult,
    FreezeRoundController, FutureEventBuffer, InOrderLinker, LinkError, LinkResult, LinkedEvent,
};
pub use pipeline::{spawn_pipeline, IntakeMessage, PipelineError, PipelineHandle};
pub use ports::{ConsensusEngineApi, FreezeChecker, RosterProvider};
pub use service::{ConsensusDependencies, ConsensusEngine};
