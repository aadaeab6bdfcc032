//! Domain layer for event intake

mod orphan_buffer;

pub use orphan_buffer::OrphanBuffer;
