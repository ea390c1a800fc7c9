//! User notifications
//!
//! Commands report outcomes to the user through a [`Notifier`]. Delivery is
//! fire-and-forget; a notifier never fails back into the store.

use crate::api::ApiError;

/// Tracing target for user notifications
pub const NOTIFY_TARGET: &str = "fitlog::notify";

/// How a notification should be presented
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Something was saved
    Success,
    /// The user needs to fix their input
    Warning,
    /// A remote operation failed
    Error,
}

/// Sink for user-facing messages
pub trait Notifier: Send + Sync {
    /// Deliver a message
    fn notify(&self, severity: Severity, message: &str);

    /// Deliver a success message
    fn success(&self, message: &str) {
        self.notify(Severity::Success, message);
    }

    /// Deliver a warning
    fn warning(&self, message: &str) {
        self.notify(Severity::Warning, message);
    }

    /// Deliver an error
    fn error(&self, message: &str) {
        self.notify(Severity::Error, message);
    }
}

/// Notifier that emits tracing events on [`NOTIFY_TARGET`]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Success => tracing::info!(target: NOTIFY_TARGET, "{message}"),
            Severity::Warning => tracing::warn!(target: NOTIFY_TARGET, "{message}"),
            Severity::Error => tracing::error!(target: NOTIFY_TARGET, "{message}"),
        }
    }
}

/// Log a failed remote call and tell the user
///
/// Client errors are expected outcomes and only warned about; anything else
/// is logged as an error. The user sees `message` either way.
pub fn report_remote_failure(notifier: &dyn Notifier, message: &str, error: &ApiError) {
    if error.is_expected() {
        tracing::warn!(%error, "Remote rejected request");
    } else {
        tracing::error!(%error, "Remote request failed");
    }
    notifier.error(message);
}
