//! # Hashgraph Ordering Test Suite
//!
//! Unified test crate for flows that span more than one subsystem crate.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Gossip generator and engine builders
//! └── integration/      # Intake → consensus flows
//!     ├── engine_flows.rs
//!     ├── reconnect.rs
//!     ├── freeze.rs
//!     ├── pipeline.rs
//!     └── properties.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p hg-tests
//!
//! # With logs
//! RUST_LOG=hg_02_consensus=debug cargo test -p hg-tests -- --nocapture
//!
//! # Benchmarks
//! cargo bench -p hg-tests
//! ```

#![allow(dead_code)]

pub mod fixtures;

use tracing_subscriber::EnvFilter;

/// Install a test log subscriber once, honoring `RUST_LOG`.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
