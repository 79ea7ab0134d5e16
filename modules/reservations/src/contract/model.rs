use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Months, Utc};
use uuid::Uuid;

/// Role bound to an identity. One role per identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    pub fn is_staff_or_admin(&self) -> bool {
        matches!(self, Role::Staff | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

/// Lifecycle status of a reservation. `Pending` is the only initial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ReservationStatus {
    pub const ALL: [ReservationStatus; 4] = [
        ReservationStatus::Pending,
        ReservationStatus::Approved,
        ReservationStatus::Rejected,
        ReservationStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReservationStatus::Pending),
            "approved" => Ok(ReservationStatus::Approved),
            "rejected" => Ok(ReservationStatus::Rejected),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            other => Err(UnknownValue(other.to_string())),
        }
    }
}

/// Parse failure for the string-backed enums above.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownValue(pub String);

/// Actions a caller may attempt against reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservationAction {
    Create,
    Cancel,
    Approve,
    Reject,
    EditFields,
    Delete,
}

impl ReservationAction {
    /// Actions that require an explicit confirmation before the mutation is issued.
    pub fn is_destructive(&self) -> bool {
        matches!(
            self,
            ReservationAction::Cancel | ReservationAction::Reject | ReservationAction::Delete
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationAction::Create => "create",
            ReservationAction::Cancel => "cancel",
            ReservationAction::Approve => "approve",
            ReservationAction::Reject => "reject",
            ReservationAction::EditFields => "edit",
            ReservationAction::Delete => "delete",
        }
    }
}

impl fmt::Display for ReservationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure reservation model for inter-module communication (no serde)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: ReservationStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft for a new reservation. Owner comes from the acting identity,
/// status is always `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub room_id: Uuid,
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Partial field update (title / room / time window). Never touches status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReservationPatch {
    pub title: Option<String>,
    pub room_id: Option<Uuid>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ReservationPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.room_id.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
    }

    /// Merge the present fields into `target`.
    pub fn apply_to(&self, target: &mut Reservation) {
        if let Some(title) = &self.title {
            target.title = title.clone();
        }
        if let Some(room_id) = self.room_id {
            target.room_id = room_id;
        }
        if let Some(start) = self.start_time {
            target.start_time = start;
        }
        if let Some(end) = self.end_time {
            target.end_time = end;
        }
    }
}

/// Inclusive time window: reservations starting at or after `from`
/// and ending at or before `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Calendar-style window around `now`.
    pub fn around(now: DateTime<Utc>, months_back: u32, months_forward: u32) -> Self {
        let from = now
            .checked_sub_months(Months::new(months_back))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let to = now
            .checked_add_months(Months::new(months_forward))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { from, to }
    }

    pub fn contains(&self, r: &Reservation) -> bool {
        r.start_time >= self.from && r.end_time <= self.to
    }
}

/// Fetch filter. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub status: Option<ReservationStatus>,
    pub window: Option<TimeWindow>,
    /// Only reservations with `start_time` strictly after this instant.
    pub starts_after: Option<DateTime<Utc>>,
}

impl ReservationFilter {
    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn by_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, r: &Reservation) -> bool {
        self.id.map_or(true, |id| r.id == id)
            && self.user_id.map_or(true, |u| r.user_id == u)
            && self.status.map_or(true, |s| r.status == s)
            && self.window.map_or(true, |w| w.contains(r))
            && self.starts_after.map_or(true, |t| r.start_time > t)
    }
}

/// Room reference data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
}

/// Authenticated identity as issued by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// Role record of an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    /// `None` when the stored role is not one of the known roles.
    pub role: Option<Role>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Who is acting: identity plus the role resolved for it.
/// A missing role grants nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub identity_id: Uuid,
    pub role: Option<Role>,
}

impl Actor {
    pub fn new(identity_id: Uuid, role: Option<Role>) -> Self {
        Self { identity_id, role }
    }
}

/// Outcome of a status transition request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub reservation: Reservation,
    /// `false` when the reservation already was in the requested status.
    pub changed: bool,
}

/// Counters shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub rooms: u64,
    pub reservations: u64,
    pub pending: u64,
    pub my_upcoming: u64,
}
