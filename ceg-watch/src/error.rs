use thiserror::Error;

/// Failure surface for the watcher/prediction/reconciler subsystem (§7).
///
/// A handler failure is isolated per-handler (§4.J "Notification") and never
/// surfaces as a hard error to the caller driving the fan-out; it is
/// collected here only so the dispatcher can report which handlers failed.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("notification handler {handler} failed: {message}")]
    HandlerFailed { handler: String, message: String },

    #[error("graph query failed during reconciliation: {0}")]
    GraphQuery(String),
}
