use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::ReservationsApi,
    error::ReservationsError,
    model::{
        Actor, DashboardStats, Identity, NewReservation, Profile, Reservation, ReservationFilter,
        ReservationPatch, Room, TransitionResult,
    },
};
use crate::domain::service::Service;

/// Local implementation of the ReservationsApi trait that delegates to the domain service
pub struct ReservationsLocalClient {
    service: Arc<Service>,
}

impl ReservationsLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl ReservationsApi for ReservationsLocalClient {
    async fn list_reservations(
        &self,
        filter: ReservationFilter,
    ) -> Result<Vec<Reservation>, ReservationsError> {
        Ok(self.service.list_reservations(filter).await?)
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Reservation, ReservationsError> {
        Ok(self.service.get_reservation(id).await?)
    }

    async fn create_reservation(
        &self,
        actor: &Actor,
        draft: NewReservation,
    ) -> Result<Reservation, ReservationsError> {
        Ok(self.service.create_reservation(actor, draft).await?)
    }

    async fn approve_reservation(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, ReservationsError> {
        Ok(self.service.approve_reservation(actor, id).await?)
    }

    async fn reject_reservation(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, ReservationsError> {
        Ok(self.service.reject_reservation(actor, id).await?)
    }

    async fn cancel_reservation(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, ReservationsError> {
        Ok(self.service.cancel_reservation(actor, id).await?)
    }

    async fn update_reservation_fields(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: ReservationPatch,
    ) -> Result<Reservation, ReservationsError> {
        Ok(self
            .service
            .update_reservation_fields(actor, id, patch)
            .await?)
    }

    async fn delete_reservation(&self, actor: &Actor, id: Uuid) -> Result<(), ReservationsError> {
        Ok(self.service.delete_reservation(actor, id).await?)
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, ReservationsError> {
        Ok(self.service.list_rooms().await?)
    }

    async fn ensure_profile(&self, identity: &Identity) -> Result<Profile, ReservationsError> {
        Ok(self.service.ensure_profile(identity).await?)
    }

    async fn resolve_actor(&self, identity: &Identity) -> Result<Actor, ReservationsError> {
        Ok(self.service.resolve_actor(identity).await?)
    }

    async fn dashboard_stats(&self, actor: &Actor) -> Result<DashboardStats, ReservationsError> {
        Ok(self.service.dashboard_stats(actor).await?)
    }
}
