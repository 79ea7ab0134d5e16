use thiserror::Error;
use uuid::Uuid;

use crate::contract::model::{ReservationAction, ReservationStatus};

/// Errors that are safe to expose to other modules and views
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReservationsError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Action '{action}' is not permitted: {reason}")]
    Forbidden {
        action: ReservationAction,
        reason: String,
    },

    #[error("Reservation {id} is already {current}, cannot become {requested}")]
    Conflict {
        id: Uuid,
        current: ReservationStatus,
        requested: ReservationStatus,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Profile setup failed: {message}")]
    ProfileSetup { message: String },

    #[error("Internal error")]
    Internal,
}

impl ReservationsError {
    pub fn not_found(entity: &'static str, id: Uuid) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn forbidden(action: ReservationAction, reason: impl Into<String>) -> Self {
        Self::Forbidden {
            action,
            reason: reason.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal() -> Self {
        Self::Internal
    }

    /// Failures a user may retry manually: store unavailable or timed out.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Internal)
    }
}

impl From<crate::domain::error::DomainError> for ReservationsError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            ReservationNotFound { id } => Self::not_found("Reservation", id),
            RoomNotFound { id } => Self::validation(format!("Unknown room: {}", id)),
            Forbidden { action, reason } => Self::forbidden(action, reason.to_string()),
            InvalidTransition { id, from, to } => Self::Conflict {
                id,
                current: from,
                requested: to,
            },
            EmptyTitle => Self::validation("Title cannot be empty"),
            TitleTooLong { len, max } => Self::validation(format!(
                "Title too long: {} characters (max: {})",
                len, max
            )),
            InvalidTimeWindow { start, end } => Self::validation(format!(
                "Start time {} must be before end time {}",
                start, end
            )),
            EmptyPatch => Self::validation("Update contains no fields"),
            ProfileSetup { message } => Self::ProfileSetup { message },
            Database { .. } => Self::internal(),
        }
    }
}
