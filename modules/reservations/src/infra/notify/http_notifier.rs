use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

use crate::domain::ports::{StatusChangeEvent, StatusNotifier};

/// Body of the mail endpoint call.
#[derive(Debug, Serialize)]
struct MailPayload<'a> {
    id: Uuid,
    status: &'a str,
    title: &'a str,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    user_id: Uuid,
    room_id: Uuid,
    email: &'a str,
    subject: &'a str,
}

impl<'a> From<&'a StatusChangeEvent> for MailPayload<'a> {
    fn from(e: &'a StatusChangeEvent) -> Self {
        Self {
            id: e.id,
            status: e.status.as_str(),
            title: &e.title,
            start_time: e.start_time,
            end_time: e.end_time,
            user_id: e.user_id,
            room_id: e.room_id,
            email: &e.email,
            subject: e.subject(),
        }
    }
}

/// HTTP adapter implementing the StatusNotifier port.
/// Authenticates with a shared-secret bearer token.
pub struct HttpStatusNotifier {
    client: reqwest::Client,
    endpoint: Url,
    secret: String,
}

impl HttpStatusNotifier {
    pub fn new(endpoint: Url, secret: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building notification HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            secret: secret.into(),
        })
    }
}

#[async_trait]
impl StatusNotifier for HttpStatusNotifier {
    #[instrument(
        name = "reservations.http.notify_status",
        skip_all,
        fields(endpoint = %self.endpoint, reservation_id = %event.id, status = %event.status)
    )]
    async fn notify(&self, event: &StatusChangeEvent) -> anyhow::Result<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.secret)
            .json(&MailPayload::from(event))
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("mail endpoint returned HTTP {}", status);
        }

        debug!("Notification delivered");
        Ok(())
    }
}
