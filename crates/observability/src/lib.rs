//! Process-wide tracing setup shared by the binaries.

pub mod tracing;

pub use crate::tracing::{LogFormat, ObservabilityConfig};

/// Initialize tracing with JSON output and `RUST_LOG` filtering (default `info`).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init_with(&ObservabilityConfig::default());
}

/// Initialize tracing with explicit settings. Same no-op rule as [`init`].
pub fn init_with(config: &ObservabilityConfig) {
    tracing::init_with(config);
}
