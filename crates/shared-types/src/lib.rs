//! # Shared Types Crate
//!
//! Entities shared by the event-intake and consensus subsystems.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: events, windows, rounds and snapshots are
//!   defined once here and passed by value between pipeline stages.
//! - **Immutability**: events and finalized rounds are never mutated after
//!   creation; stages derive new values instead.

pub mod entities;
pub mod errors;
pub mod hashgraph;

pub use entities::*;
pub use errors::*;
pub use hashgraph::*;
