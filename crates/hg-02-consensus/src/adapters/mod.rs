//! Adapters layer (Hexagonal Architecture)

mod freeze;
mod roster;

pub use freeze::*;
pub use roster::*;
