//! User-facing outcome notifications for writes.

use crate::error::ErrorCategory;

/// Receives exactly one call per completed mutation.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, category: ErrorCategory, message: &str);
}

/// Forwards notifications to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!("✅ {}", message);
    }

    fn error(&self, category: ErrorCategory, message: &str) {
        tracing::error!(?category, "❌ {}", message);
    }
}
