//! Batch forecast synchronization.

pub mod cancel;
pub mod orchestrator;
pub mod report;

pub use cancel::{CancelHandle, CancelSignal, cancellation};
pub use orchestrator::SyncOrchestrator;
pub use report::{SyncReport, SyncStatus};
