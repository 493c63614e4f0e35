//! Tracing setup and the service observer seam.

/// Initialize process-wide logging. Safe to call more than once.
pub fn init() {
    tracing::init();
}

pub mod tracing;

/// Diagnostic events emitted by application services.
pub mod observer;

pub use observer::{Observer, RecordingObserver, ServiceEvent, TracingObserver};
