use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{ReservationAction, ReservationStatus};
use crate::domain::permissions::DenyReason;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Reservation not found: {id}")]
    ReservationNotFound { id: Uuid },

    #[error("Room not found: {id}")]
    RoomNotFound { id: Uuid },

    #[error("Action '{action}' denied: {reason}")]
    Forbidden {
        action: ReservationAction,
        reason: DenyReason,
    },

    #[error("Reservation {id} is {from}, cannot become {to}")]
    InvalidTransition {
        id: Uuid,
        from: ReservationStatus,
        to: ReservationStatus,
    },

    #[error("Title cannot be empty")]
    EmptyTitle,

    #[error("Title too long: {len} characters (max: {max})")]
    TitleTooLong { len: usize, max: usize },

    #[error("Start time {start} must be before end time {end}")]
    InvalidTimeWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Update contains no fields")]
    EmptyPatch,

    #[error("Profile setup failed: {message}")]
    ProfileSetup { message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn reservation_not_found(id: Uuid) -> Self {
        Self::ReservationNotFound { id }
    }

    pub fn room_not_found(id: Uuid) -> Self {
        Self::RoomNotFound { id }
    }

    pub fn forbidden(action: ReservationAction, reason: DenyReason) -> Self {
        Self::Forbidden { action, reason }
    }

    pub fn invalid_transition(id: Uuid, from: ReservationStatus, to: ReservationStatus) -> Self {
        Self::InvalidTransition { id, from, to }
    }

    pub fn title_too_long(len: usize, max: usize) -> Self {
        Self::TitleTooLong { len, max }
    }

    pub fn invalid_time_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::InvalidTimeWindow { start, end }
    }

    pub fn profile_setup(message: impl Into<String>) -> Self {
        Self::ProfileSetup {
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
