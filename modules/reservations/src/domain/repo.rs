use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::contract::model::{
    Profile, Reservation, ReservationFilter, ReservationPatch, ReservationStatus, Room,
};

/// Persistence port for reservations.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait ReservationsRepository: Send + Sync {
    /// Matching rows ordered by `start_time` ascending.
    async fn list(&self, filter: &ReservationFilter) -> anyhow::Result<Vec<Reservation>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Reservation>>;
    /// Insert a fully-formed reservation.
    ///
    /// Service computes id/status/timestamps; repo persists.
    async fn insert(&self, r: &Reservation) -> anyhow::Result<()>;
    /// Compare-and-set on status. Returns false when no row had `expected`.
    async fn update_status_if(
        &self,
        id: Uuid,
        expected: ReservationStatus,
        next: ReservationStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
    /// Writes only the fields present in `patch`. Returns false if the row is gone.
    async fn update_fields(
        &self,
        id: Uuid,
        patch: &ReservationPatch,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;
    /// Delete by id. Returns true if a row was deleted.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn count(&self, filter: &ReservationFilter) -> anyhow::Result<u64>;
}

/// Read-mostly room reference data.
#[async_trait]
pub trait RoomsRepository: Send + Sync {
    /// All rooms ordered by name.
    async fn list(&self) -> anyhow::Result<Vec<Room>>;
    async fn exists(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn count(&self) -> anyhow::Result<u64>;
    /// Return the room called `name`, creating it when absent.
    async fn ensure(&self, name: &str) -> anyhow::Result<Room>;
}

/// Role records keyed by identity id.
#[async_trait]
pub trait ProfilesRepository: Send + Sync {
    /// `Ok(None)` is the normal "no row" outcome, not an error.
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Profile>>;
    async fn insert(&self, profile: &Profile) -> anyhow::Result<()>;
}
