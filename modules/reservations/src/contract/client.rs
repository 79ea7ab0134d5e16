use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::ReservationsError,
    model::{
        Actor, DashboardStats, Identity, NewReservation, Profile, Reservation, ReservationFilter,
        ReservationPatch, Room, TransitionResult,
    },
};

/// Public API of the reservations module: the store gateway as seen by
/// views and other modules. Every mutation is authorized for `actor` here,
/// whatever the caller already checked.
#[async_trait]
pub trait ReservationsApi: Send + Sync {
    /// Reservations matching `filter`, ordered by `start_time` ascending.
    async fn list_reservations(
        &self,
        filter: ReservationFilter,
    ) -> Result<Vec<Reservation>, ReservationsError>;

    async fn get_reservation(&self, id: Uuid) -> Result<Reservation, ReservationsError>;

    /// Create a `pending` reservation owned by `actor`.
    async fn create_reservation(
        &self,
        actor: &Actor,
        draft: NewReservation,
    ) -> Result<Reservation, ReservationsError>;

    async fn approve_reservation(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, ReservationsError>;

    async fn reject_reservation(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, ReservationsError>;

    async fn cancel_reservation(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, ReservationsError>;

    async fn update_reservation_fields(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: ReservationPatch,
    ) -> Result<Reservation, ReservationsError>;

    /// Hard removal. Distinct from cancelling.
    async fn delete_reservation(&self, actor: &Actor, id: Uuid) -> Result<(), ReservationsError>;

    async fn list_rooms(&self) -> Result<Vec<Room>, ReservationsError>;

    /// Idempotent: returns the existing role record or creates a `student` one.
    async fn ensure_profile(&self, identity: &Identity) -> Result<Profile, ReservationsError>;

    /// Bootstrap the profile of `identity` and resolve the acting role.
    async fn resolve_actor(&self, identity: &Identity) -> Result<Actor, ReservationsError>;

    async fn dashboard_stats(&self, actor: &Actor) -> Result<DashboardStats, ReservationsError>;
}
