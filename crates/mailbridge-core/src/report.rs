//! Where the dispatcher sends its diagnostics.

use tracing::{error, info};

/// Receives the outcome of every dispatcher operation.
///
/// Failure causes go here even when the caller only sees a generic message.
pub trait Reporter {
    /// An operation on `profile` succeeded.
    fn success(&self, operation: &str, profile: &str);

    /// An operation failed; `cause` is the underlying error.
    fn failure(&self, operation: &str, profile: &str, cause: &dyn std::error::Error);
}

/// Emits reports as `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn success(&self, operation: &str, profile: &str) {
        info!(operation, profile, "completed");
    }

    fn failure(&self, operation: &str, profile: &str, cause: &dyn std::error::Error) {
        error!(operation, profile, "failed: {cause}");
    }
}

impl<R: Reporter + ?Sized> Reporter for &R {
    fn success(&self, operation: &str, profile: &str) {
        (**self).success(operation, profile);
    }

    fn failure(&self, operation: &str, profile: &str, cause: &dyn std::error::Error) {
        (**self).failure(operation, profile, cause);
    }
}
