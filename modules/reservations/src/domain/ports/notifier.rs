use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{Reservation, ReservationStatus};

/// Payload sent to the mail endpoint on creation and on every status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChangeEvent {
    pub id: Uuid,
    pub status: ReservationStatus,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub user_id: Uuid,
    pub room_id: Uuid,
    pub email: String,
}

impl StatusChangeEvent {
    pub fn new(r: &Reservation, email: impl Into<String>) -> Self {
        Self {
            id: r.id,
            status: r.status,
            title: r.title.clone(),
            start_time: r.start_time,
            end_time: r.end_time,
            user_id: r.user_id,
            room_id: r.room_id,
            email: email.into(),
        }
    }

    /// Mail subject for the reservation status.
    pub fn subject(&self) -> &'static str {
        match self.status {
            ReservationStatus::Pending => "Reservation Submitted",
            ReservationStatus::Approved => "Reservation Approved",
            ReservationStatus::Rejected => "Reservation Rejected",
            ReservationStatus::Cancelled => "Reservation Cancelled",
        }
    }
}

/// Outgoing notification port. Failures never roll back the change that
/// triggered them.
#[async_trait]
pub trait StatusNotifier: Send + Sync {
    async fn notify(&self, event: &StatusChangeEvent) -> anyhow::Result<()>;
}

/// Notifier that accepts and drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl StatusNotifier for NoopNotifier {
    async fn notify(&self, _event: &StatusChangeEvent) -> anyhow::Result<()> {
        Ok(())
    }
}
