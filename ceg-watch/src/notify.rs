use crate::error::WatchError;
use async_trait::async_trait;
use ceg_core::watch::TriggeredWatch;
use tracing::{info, warn};

/// A registered notification sink for a [`TriggeredWatch`] (§4.J
/// "Notification": "webhook/chat/log"). Implementations live outside this
/// crate; the concrete webhook/chat transports are out of scope (§1).
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    fn name(&self) -> &str;
    async fn notify(&self, watch: &TriggeredWatch) -> Result<(), WatchError>;
}

/// Fans a [`TriggeredWatch`] out to every registered handler. Handlers are
/// best-effort: one handler's failure is isolated and does not block the
/// others (§4.J, §7 "Watcher handler failure").
#[derive(Default)]
pub struct NotificationDispatcher {
    handlers: Vec<Box<dyn NotificationHandler>>,
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("handler_count", &self.handlers.len())
            .finish()
    }
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Box<dyn NotificationHandler>) {
        self.handlers.push(handler);
    }

    /// Dispatch `watch` to every handler, collecting the names of any that
    /// failed. Never returns early: a failing handler cannot suppress
    /// delivery to the rest.
    pub async fn dispatch(&self, watch: &TriggeredWatch) -> Vec<String> {
        let mut failed = Vec::new();
        for handler in &self.handlers {
            if let Err(error) = handler.notify(watch).await {
                warn!(handler = handler.name(), %error, "notification handler failed");
                failed.push(handler.name().to_string());
            }
        }
        failed
    }
}

/// The one concrete [`NotificationHandler`] this crate ships: logs every
/// trigger at `info` via `tracing`. The webhook and chat transports named in
/// §4.J are genuinely external (§1 Non-goals) and are left to the deploying
/// binary; `log` is not, since it is the ambient logging stack every crate
/// already depends on.
#[derive(Debug, Default)]
pub struct LogNotificationHandler;

#[async_trait]
impl NotificationHandler for LogNotificationHandler {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, watch: &TriggeredWatch) -> Result<(), WatchError> {
        info!(
            rule = %watch.rule_id,
            trigger_event = %watch.trigger_event,
            expires_at = %watch.expires_at,
            "watch triggered"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        name: String,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationHandler for CountingHandler {
        fn name(&self) -> &str {
            &self.name
        }

        async fn notify(&self, _watch: &TriggeredWatch) -> Result<(), WatchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(WatchError::HandlerFailed {
                    handler: self.name.clone(),
                    message: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn watch() -> TriggeredWatch {
        let now = Utc::now();
        TriggeredWatch {
            rule_id: "rule1".into(),
            trigger_event: "ev1".into(),
            opened_at: now,
            expires_at: now + chrono::Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn one_handler_failure_does_not_block_others() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = NotificationDispatcher::new();
        dispatcher.register(Box::new(CountingHandler {
            name: "webhook".into(),
            calls: calls.clone(),
            fail: true,
        }));
        dispatcher.register(Box::new(CountingHandler {
            name: "log".into(),
            calls: calls.clone(),
            fail: false,
        }));

        let failed = dispatcher.dispatch(&watch()).await;
        assert_eq!(failed, vec!["webhook".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
