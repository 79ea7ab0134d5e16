use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::contract::model::{
    DashboardStats, NewReservation, Profile, Reservation, ReservationAction, ReservationPatch,
    Room, TransitionResult,
};

/// REST DTO for reservation representation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationDto {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// `pending | approved | rejected | cancelled`
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Actions the caller may perform on this reservation right now.
    #[serde(default)]
    pub allowed_actions: Vec<String>,
}

/// REST DTO for creating a reservation; the owner is the caller
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateReservationReq {
    pub room_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// REST DTO for editing an approved reservation (partial)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Default)]
#[serde(deny_unknown_fields)]
pub struct UpdateReservationReq {
    pub title: Option<String>,
    pub room_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransitionDto {
    pub reservation: ReservationDto,
    /// False when the reservation already had the requested status.
    pub changed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationListDto {
    pub reservations: Vec<ReservationDto>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomDto {
    pub id: Uuid,
    pub name: String,
}

/// Caller's profile and role as resolved server-side
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MeDto {
    pub id: Uuid,
    pub email: String,
    /// `None` when no known role is assigned; nothing is permitted then.
    pub role: Option<String>,
    pub can_create: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StatsDto {
    pub rooms: u64,
    pub reservations: u64,
    pub pending: u64,
    pub my_upcoming: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthDto {
    pub status: String,
}

/// REST DTO for list query parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListReservationsQuery {
    pub user_id: Option<Uuid>,
    /// Only the caller's own reservations.
    pub mine: Option<bool>,
    pub status: Option<String>,
    /// Window start (reservations starting at or after).
    pub from: Option<DateTime<Utc>>,
    /// Window end (reservations ending at or before).
    pub to: Option<DateTime<Utc>>,
}

// Conversion implementations between REST DTOs and contract models

impl ReservationDto {
    pub fn with_actions(r: Reservation, actions: &[ReservationAction]) -> Self {
        let mut dto = Self::from(r);
        dto.allowed_actions = actions.iter().map(|a| a.as_str().to_string()).collect();
        dto
    }
}

impl From<Reservation> for ReservationDto {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            room_id: r.room_id,
            user_id: r.user_id,
            title: r.title,
            start_time: r.start_time,
            end_time: r.end_time,
            status: r.status.as_str().to_string(),
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
            allowed_actions: Vec::new(),
        }
    }
}

impl From<CreateReservationReq> for NewReservation {
    fn from(req: CreateReservationReq) -> Self {
        Self {
            room_id: req.room_id,
            title: req.title,
            start_time: req.start_time,
            end_time: req.end_time,
            notes: req.notes,
        }
    }
}

impl From<UpdateReservationReq> for ReservationPatch {
    fn from(req: UpdateReservationReq) -> Self {
        Self {
            title: req.title,
            room_id: req.room_id,
            start_time: req.start_time,
            end_time: req.end_time,
        }
    }
}

impl From<TransitionResult> for TransitionDto {
    fn from(t: TransitionResult) -> Self {
        Self {
            reservation: t.reservation.into(),
            changed: t.changed,
        }
    }
}

impl From<Room> for RoomDto {
    fn from(r: Room) -> Self {
        Self {
            id: r.id,
            name: r.name,
        }
    }
}

impl From<DashboardStats> for StatsDto {
    fn from(s: DashboardStats) -> Self {
        Self {
            rooms: s.rooms,
            reservations: s.reservations,
            pending: s.pending,
            my_upcoming: s.my_upcoming,
        }
    }
}

impl MeDto {
    pub fn new(email: String, profile: &Profile, can_create: bool) -> Self {
        Self {
            id: profile.id,
            email,
            role: profile.role.map(|r| r.as_str().to_string()),
            can_create,
        }
    }
}
