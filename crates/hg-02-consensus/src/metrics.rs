//! # Consensus Metrics
//!
//! Prometheus metrics for monitoring linking and round production.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! hg-02-consensus = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `linker_events_linked_total` - Counter of events handed to consensus
//! - `linker_events_dropped_total` - Counter of events the linker refused (by reason)
//! - `linker_parent_mismatch_total` - Counter of malformed events
//! - `consensus_rounds_emitted_total` - Counter of finalized rounds
//! - `consensus_latest_round` - Gauge of the latest finalized round
//! - `consensus_future_buffer_size` - Gauge of events waiting for their birth round
//! - `consensus_freeze_total` - Counter of freeze rounds reached

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Events linked and passed to the consensus core
    pub static ref EVENTS_LINKED: IntCounter = register_int_counter!(
        "linker_events_linked_total",
        "Total number of events linked"
    )
    .expect("Failed to create EVENTS_LINKED metric");

    /// Events dropped by the linker, labeled by reason
    pub static ref LINK_DROPPED: IntCounterVec = register_int_counter_vec!(
        "linker_events_dropped_total",
        "Total number of events the linker refused",
        &["reason"]
    )
    .expect("Failed to create LINK_DROPPED metric");

    /// Events with inconsistent parent metadata
    pub static ref PARENT_MISMATCH: IntCounter = register_int_counter!(
        "linker_parent_mismatch_total",
        "Total number of events with parent metadata mismatches"
    )
    .expect("Failed to create PARENT_MISMATCH metric");

    /// Finalized rounds
    pub static ref ROUNDS_EMITTED: IntCounter = register_int_counter!(
        "consensus_rounds_emitted_total",
        "Total number of consensus rounds emitted"
    )
    .expect("Failed to create ROUNDS_EMITTED metric");

    /// Latest finalized round
    pub static ref LATEST_ROUND: IntGauge = register_int_gauge!(
        "consensus_latest_round",
        "Latest round to reach consensus"
    )
    .expect("Failed to create LATEST_ROUND metric");

    /// Events held by the future event buffer
    pub static ref FUTURE_BUFFER_SIZE: IntGauge = register_int_gauge!(
        "consensus_future_buffer_size",
        "Number of events waiting for their birth round"
    )
    .expect("Failed to create FUTURE_BUFFER_SIZE metric");

    /// Freeze rounds reached
    pub static ref FREEZE_REACHED: IntCounter = register_int_counter!(
        "consensus_freeze_total",
        "Number of times a freeze round was reached"
    )
    .expect("Failed to create FREEZE_REACHED metric");
}

/// Record a linked event
#[cfg(feature = "metrics")]
pub fn record_event_linked() {
    EVENTS_LINKED.inc();
}

/// Record an event refused by the linker
#[cfg(feature = "metrics")]
pub fn record_link_dropped(reason: &str) {
    LINK_DROPPED.with_label_values(&[reason]).inc();
}

/// Record a malformed event
#[cfg(feature = "metrics")]
pub fn record_parent_mismatch() {
    PARENT_MISMATCH.inc();
}

/// Record a finalized round
#[cfg(feature = "metrics")]
pub fn record_round_emitted(round: u64) {
    ROUNDS_EMITTED.inc();
    LATEST_ROUND.set(round as i64);
}

/// Set the future buffer size
#[cfg(feature = "metrics")]
pub fn set_future_buffer_size(size: usize) {
    FUTURE_BUFFER_SIZE.set(size as i64);
}

/// Record that the freeze round was reached
#[cfg(feature = "metrics")]
pub fn record_freeze() {
    FREEZE_REACHED.inc();
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_event_linked() {}

#[cfg(not(feature = "metrics"))]
pub fn record_link_dropped(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_parent_mismatch() {}

#[cfg(not(feature = "metrics"))]
pub fn record_round_emitted(_round: u64) {}

#[cfg(not(feature = "metrics"))]
pub fn set_future_buffer_size(_size: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_freeze() {}
