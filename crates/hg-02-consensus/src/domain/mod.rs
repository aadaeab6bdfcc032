//! Domain layer for consensus
//!
//! Pure ordering logic with no async or channel concerns.

pub mod error;
pub mod freeze;
pub mod future_buffer;
pub mod hashgraph;
pub mod linker;

pub use error::*;
pub use freeze::FreezeRoundController;
pub use future_buffer::FutureEventBuffer;
pub use hashgraph::{event_window_from_snapshot, ConsensusCore};
pub use linker::{InOrderLinker, LinkedEvent};
