//! # Event Intake Metrics
//!
//! Prometheus metrics for monitoring the orphan buffer.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! hg-01-event-intake = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `intake_events_received_total` - Counter of events submitted to the buffer
//! - `intake_events_dropped_total` - Counter of dropped events (by reason)
//! - `intake_events_released_total` - Counter of events released downstream
//! - `intake_orphan_count` - Gauge of events currently waiting for parents

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total events submitted to the orphan buffer
    pub static ref EVENTS_RECEIVED: IntCounter = register_int_counter!(
        "intake_events_received_total",
        "Total number of events submitted to the orphan buffer"
    )
    .expect("Failed to create EVENTS_RECEIVED metric");

    /// Events dropped, labeled by reason
    pub static ref EVENTS_DROPPED: IntCounterVec = register_int_counter_vec!(
        "intake_events_dropped_total",
        "Total number of events dropped by the orphan buffer",
        &["reason"]
    )
    .expect("Failed to create EVENTS_DROPPED metric");

    /// Total events released downstream
    pub static ref EVENTS_RELEASED: IntCounter = register_int_counter!(
        "intake_events_released_total",
        "Total number of events released by the orphan buffer"
    )
    .expect("Failed to create EVENTS_RELEASED metric");

    /// Current number of orphans
    pub static ref ORPHAN_COUNT: IntGauge = register_int_gauge!(
        "intake_orphan_count",
        "Number of events waiting for missing parents"
    )
    .expect("Failed to create ORPHAN_COUNT metric");
}

/// Record an event submitted to the buffer
#[cfg(feature = "metrics")]
pub fn record_event_received() {
    EVENTS_RECEIVED.inc();
}

/// Record a dropped event with reason
#[cfg(feature = "metrics")]
pub fn record_event_dropped(reason: &str) {
    EVENTS_DROPPED.with_label_values(&[reason]).inc();
}

/// Record released events
#[cfg(feature = "metrics")]
pub fn record_events_released(count: usize) {
    EVENTS_RELEASED.inc_by(count as u64);
}

/// Set the current orphan count
#[cfg(feature = "metrics")]
pub fn set_orphan_count(count: usize) {
    ORPHAN_COUNT.set(count as i64);
}

// No-op implementations when metrics feature is disabled
#[cfg(not(feature = "metrics"))]
pub fn record_event_received() {}

#[cfg(not(feature = "metrics"))]
pub fn record_event_dropped(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_events_released(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn set_orphan_count(_count: usize) {}
