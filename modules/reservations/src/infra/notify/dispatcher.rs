use std::sync::Arc;

use async_trait::async_trait;
use tracing::{warn, Instrument};

use crate::domain::ports::{StatusChangeEvent, StatusNotifier};

/// Fire-and-forget wrapper: delivery runs on a spawned task, failures are
/// logged and never retried.
#[derive(Clone)]
pub struct NotificationDispatcher {
    inner: Arc<dyn StatusNotifier>,
}

impl NotificationDispatcher {
    pub fn new(inner: Arc<dyn StatusNotifier>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StatusNotifier for NotificationDispatcher {
    async fn notify(&self, event: &StatusChangeEvent) -> anyhow::Result<()> {
        let inner = self.inner.clone();
        let event = event.clone();
        tokio::spawn(
            async move {
                if let Err(e) = inner.notify(&event).await {
                    warn!(
                        error = %e,
                        reservation_id = %event.id,
                        status = %event.status,
                        "Notification delivery failed"
                    );
                }
            }
            .in_current_span(),
        );
        Ok(())
    }
}
