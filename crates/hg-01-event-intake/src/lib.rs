//! # hg-01-event-intake
//!
//! Event intake subsystem: the orphan buffer that sits between signature
//! verification and the linker.
//!
//! ## Architecture
//!
//! Events arrive from gossip in arbitrary order. The orphan buffer holds each
//! event until both of its parents have been released (or are ancient) and
//! then releases it, so the stages downstream see parents before children.
//!
//! ```text
//! [Gossip] ──PlatformEvent──→ [Orphan Buffer] ──released──→ [Consensus Engine]
//!                                    ▲                             │
//!                                    └──────── EventWindow ────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hg_01_event_intake::{IntakeConfig, OrphanBuffer};
//!
//! let mut buffer = OrphanBuffer::new(IntakeConfig::default());
//! for released in buffer.handle_event(event) {
//!     engine.add_event(released)?;
//! }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;

pub use config::IntakeConfig;
pub use domain::OrphanBuffer;
pub use error::{IntakeError, IntakeResult};
pub use ports::EventIntakeApi;
