use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::ReservationStatus;

/// Transport-agnostic domain event, published after the store confirmed the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReservationEvent {
    Created {
        id: Uuid,
        at: DateTime<Utc>,
    },
    StatusChanged {
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
        at: DateTime<Utc>,
    },
    FieldsUpdated {
        id: Uuid,
        at: DateTime<Utc>,
    },
    Deleted {
        id: Uuid,
        at: DateTime<Utc>,
    },
}

impl ReservationEvent {
    pub fn reservation_id(&self) -> Uuid {
        match self {
            ReservationEvent::Created { id, .. }
            | ReservationEvent::StatusChanged { id, .. }
            | ReservationEvent::FieldsUpdated { id, .. }
            | ReservationEvent::Deleted { id, .. } => *id,
        }
    }
}
