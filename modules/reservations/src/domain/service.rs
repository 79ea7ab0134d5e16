use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn, Instrument};
use uuid::Uuid;

use crate::contract::model::{
    Actor, DashboardStats, Identity, NewReservation, Profile, Reservation, ReservationAction,
    ReservationFilter, ReservationPatch, ReservationStatus, Room, TransitionResult,
};
use crate::domain::error::DomainError;
use crate::domain::events::ReservationEvent;
use crate::domain::permissions::{authorize, authorize_actor, Decision};
use crate::domain::ports::{EventPublisher, StatusChangeEvent, StatusNotifier};
use crate::domain::repo::{ProfilesRepository, ReservationsRepository, RoomsRepository};
use crate::domain::state_machine::{self, Transition, INITIAL_STATUS};
use crate::session::bootstrap::ProfileBootstrap;

/// Domain service enforcing the lifecycle and the permission rules at the
/// store boundary. Depends only on ports, not on infra types.
#[derive(Clone)]
pub struct Service {
    reservations: Arc<dyn ReservationsRepository>,
    rooms: Arc<dyn RoomsRepository>,
    profiles: Arc<dyn ProfilesRepository>,
    bootstrap: ProfileBootstrap,
    notifier: Arc<dyn StatusNotifier>,
    events: Arc<dyn EventPublisher<ReservationEvent>>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_title_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_title_length: 200,
        }
    }
}

/// Storage ports the service is wired with.
#[derive(Clone)]
pub struct Repositories {
    pub reservations: Arc<dyn ReservationsRepository>,
    pub rooms: Arc<dyn RoomsRepository>,
    pub profiles: Arc<dyn ProfilesRepository>,
}

impl Service {
    pub fn new(
        repos: Repositories,
        notifier: Arc<dyn StatusNotifier>,
        events: Arc<dyn EventPublisher<ReservationEvent>>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            bootstrap: ProfileBootstrap::new(repos.profiles.clone()),
            reservations: repos.reservations,
            rooms: repos.rooms,
            profiles: repos.profiles,
            notifier,
            events,
            config,
        }
    }

    #[instrument(name = "reservations.service.list_reservations", skip(self))]
    pub async fn list_reservations(
        &self,
        filter: ReservationFilter,
    ) -> Result<Vec<Reservation>, DomainError> {
        debug!("Listing reservations");
        let rows = self
            .reservations
            .list(&filter)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        debug!("Listed {} reservations", rows.len());
        Ok(rows)
    }

    #[instrument(
        name = "reservations.service.get_reservation",
        skip(self),
        fields(reservation_id = %id)
    )]
    pub async fn get_reservation(&self, id: Uuid) -> Result<Reservation, DomainError> {
        debug!("Getting reservation by id");
        self.load(id).await
    }

    #[instrument(
        name = "reservations.service.create_reservation",
        skip(self, draft),
        fields(identity_id = %actor.identity_id, room_id = %draft.room_id)
    )]
    pub async fn create_reservation(
        &self,
        actor: &Actor,
        draft: NewReservation,
    ) -> Result<Reservation, DomainError> {
        info!("Creating reservation");

        if let Decision::Deny(reason) = authorize(actor, ReservationAction::Create, None) {
            return Err(DomainError::forbidden(ReservationAction::Create, reason));
        }

        self.validate_title(&draft.title)?;
        self.validate_window(&draft.start_time, &draft.end_time)?;
        self.ensure_room(draft.room_id).await?;

        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4(),
            room_id: draft.room_id,
            user_id: actor.identity_id,
            title: draft.title.trim().to_string(),
            start_time: draft.start_time,
            end_time: draft.end_time,
            status: INITIAL_STATUS,
            notes: draft.notes.filter(|n| !n.trim().is_empty()),
            created_at: now,
            updated_at: now,
        };

        self.reservations
            .insert(&reservation)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        self.events.publish(&ReservationEvent::Created {
            id: reservation.id,
            at: reservation.created_at,
        });
        self.notify(&reservation);

        info!("Created reservation with id={}", reservation.id);
        Ok(reservation)
    }

    #[instrument(
        name = "reservations.service.approve_reservation",
        skip(self),
        fields(identity_id = %actor.identity_id, reservation_id = %id)
    )]
    pub async fn approve_reservation(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, DomainError> {
        self.change_status(actor, id, ReservationAction::Approve, ReservationStatus::Approved)
            .await
    }

    #[instrument(
        name = "reservations.service.reject_reservation",
        skip(self),
        fields(identity_id = %actor.identity_id, reservation_id = %id)
    )]
    pub async fn reject_reservation(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, DomainError> {
        self.change_status(actor, id, ReservationAction::Reject, ReservationStatus::Rejected)
            .await
    }

    #[instrument(
        name = "reservations.service.cancel_reservation",
        skip(self),
        fields(identity_id = %actor.identity_id, reservation_id = %id)
    )]
    pub async fn cancel_reservation(
        &self,
        actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, DomainError> {
        self.change_status(actor, id, ReservationAction::Cancel, ReservationStatus::Cancelled)
            .await
    }

    #[instrument(
        name = "reservations.service.update_reservation_fields",
        skip(self, patch),
        fields(identity_id = %actor.identity_id, reservation_id = %id)
    )]
    pub async fn update_reservation_fields(
        &self,
        actor: &Actor,
        id: Uuid,
        patch: ReservationPatch,
    ) -> Result<Reservation, DomainError> {
        info!("Updating reservation fields");

        if patch.is_empty() {
            return Err(DomainError::EmptyPatch);
        }
        let mut current = self.load(id).await?;
        if let Decision::Deny(reason) =
            authorize(actor, ReservationAction::EditFields, Some(&current))
        {
            return Err(DomainError::forbidden(ReservationAction::EditFields, reason));
        }

        let patch = ReservationPatch {
            title: patch.title.map(|t| t.trim().to_string()),
            ..patch
        };
        if let Some(title) = &patch.title {
            self.validate_title(title)?;
        }
        if let Some(room_id) = patch.room_id {
            self.ensure_room(room_id).await?;
        }
        patch.apply_to(&mut current);
        self.validate_window(&current.start_time, &current.end_time)?;

        let now = Utc::now();
        let updated = self
            .reservations
            .update_fields(id, &patch, now)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !updated {
            return Err(DomainError::reservation_not_found(id));
        }
        current.updated_at = now;

        self.events
            .publish(&ReservationEvent::FieldsUpdated { id, at: now });

        info!("Successfully updated reservation");
        Ok(current)
    }

    #[instrument(
        name = "reservations.service.delete_reservation",
        skip(self),
        fields(identity_id = %actor.identity_id, reservation_id = %id)
    )]
    pub async fn delete_reservation(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting reservation");

        let current = self.load(id).await?;
        if let Decision::Deny(reason) = authorize(actor, ReservationAction::Delete, Some(&current))
        {
            return Err(DomainError::forbidden(ReservationAction::Delete, reason));
        }

        let deleted = self
            .reservations
            .delete(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !deleted {
            return Err(DomainError::reservation_not_found(id));
        }

        self.events
            .publish(&ReservationEvent::Deleted { id, at: Utc::now() });

        info!("Successfully deleted reservation");
        Ok(())
    }

    #[instrument(name = "reservations.service.list_rooms", skip(self))]
    pub async fn list_rooms(&self) -> Result<Vec<Room>, DomainError> {
        debug!("Listing rooms");
        self.rooms
            .list()
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    pub async fn ensure_profile(&self, identity: &Identity) -> Result<Profile, DomainError> {
        self.bootstrap.ensure_profile(identity).await
    }

    /// Bootstrap the profile, then derive the acting role from it.
    #[instrument(
        name = "reservations.service.resolve_actor",
        skip(self, identity),
        fields(identity_id = %identity.id)
    )]
    pub async fn resolve_actor(&self, identity: &Identity) -> Result<Actor, DomainError> {
        let profile = self.bootstrap.ensure_profile(identity).await?;
        if profile.role.is_none() {
            warn!("Profile has no recognised role, granting nothing");
        }
        Ok(Actor::new(identity.id, profile.role))
    }

    #[instrument(
        name = "reservations.service.dashboard_stats",
        skip(self),
        fields(identity_id = %actor.identity_id)
    )]
    pub async fn dashboard_stats(&self, actor: &Actor) -> Result<DashboardStats, DomainError> {
        debug!("Computing dashboard stats");
        let db = |e: anyhow::Error| DomainError::database(e.to_string());

        let rooms = self.rooms.count().await.map_err(db)?;
        let reservations = self
            .reservations
            .count(&ReservationFilter::default())
            .await
            .map_err(db)?;
        let pending = self
            .reservations
            .count(&ReservationFilter {
                status: Some(ReservationStatus::Pending),
                ..Default::default()
            })
            .await
            .map_err(db)?;
        let my_upcoming = self
            .reservations
            .count(&ReservationFilter {
                user_id: Some(actor.identity_id),
                starts_after: Some(Utc::now()),
                ..Default::default()
            })
            .await
            .map_err(db)?;

        Ok(DashboardStats {
            rooms,
            reservations,
            pending,
            my_upcoming,
        })
    }

    // --- transitions ---

    /// Authorize the actor, validate against the state machine, then
    /// compare-and-set the status. A lost race is resolved by re-reading:
    /// already in the target status is a no-op, anything else a conflict.
    async fn change_status(
        &self,
        actor: &Actor,
        id: Uuid,
        action: ReservationAction,
        target: ReservationStatus,
    ) -> Result<TransitionResult, DomainError> {
        info!("Changing reservation status to {}", target);

        let current = self.load(id).await?;
        if let Decision::Deny(reason) = authorize_actor(actor, action, Some(&current)) {
            return Err(DomainError::forbidden(action, reason));
        }

        let (from, to) = match state_machine::transition(current.status, target) {
            Ok(Transition::Applied { from, to }) => (from, to),
            Ok(Transition::Unchanged(_)) => {
                debug!("Already {}, nothing to do", target);
                return Ok(TransitionResult {
                    reservation: current,
                    changed: false,
                });
            }
            Err(illegal) => {
                return Err(DomainError::invalid_transition(id, illegal.from, illegal.to));
            }
        };

        let now = Utc::now();
        let swapped = self
            .reservations
            .update_status_if(id, from, to, now)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        if !swapped {
            let latest = self.load(id).await?;
            if latest.status == target {
                debug!("Concurrently moved to {}, treating as no-op", target);
                return Ok(TransitionResult {
                    reservation: latest,
                    changed: false,
                });
            }
            return Err(DomainError::invalid_transition(id, latest.status, target));
        }

        let reservation = Reservation {
            status: to,
            updated_at: now,
            ..current
        };

        self.events
            .publish(&ReservationEvent::StatusChanged { id, from, to, at: now });
        self.notify(&reservation);

        info!("Reservation moved {} -> {}", from, to);
        Ok(TransitionResult {
            reservation,
            changed: true,
        })
    }

    async fn load(&self, id: Uuid) -> Result<Reservation, DomainError> {
        self.reservations
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::reservation_not_found(id))
    }

    /// Hand the owner's mail notification to a background task. Neither the
    /// owner lookup nor the delivery is awaited by the caller.
    fn notify(&self, reservation: &Reservation) {
        let profiles = self.profiles.clone();
        let notifier = self.notifier.clone();
        let reservation = reservation.clone();
        tokio::spawn(
            async move {
                let email = match profiles.find_by_id(reservation.user_id).await {
                    Ok(Some(Profile {
                        email: Some(email), ..
                    })) => email,
                    Ok(_) => {
                        debug!(
                            user_id = %reservation.user_id,
                            "Owner has no email, skipping notification"
                        );
                        return;
                    }
                    Err(e) => {
                        warn!(error = %e, "Owner lookup for notification failed");
                        return;
                    }
                };

                let event = StatusChangeEvent::new(&reservation, email);
                if let Err(e) = notifier.notify(&event).await {
                    warn!(
                        error = %e,
                        reservation_id = %reservation.id,
                        "Status notification failed"
                    );
                }
            }
            .in_current_span(),
        );
    }

    // --- validation helpers ---

    fn validate_title(&self, title: &str) -> Result<(), DomainError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::EmptyTitle);
        }
        let len = title.chars().count();
        if len > self.config.max_title_length {
            return Err(DomainError::title_too_long(
                len,
                self.config.max_title_length,
            ));
        }
        Ok(())
    }

    fn validate_window(
        &self,
        start: &chrono::DateTime<Utc>,
        end: &chrono::DateTime<Utc>,
    ) -> Result<(), DomainError> {
        if start >= end {
            return Err(DomainError::invalid_time_window(*start, *end));
        }
        Ok(())
    }

    async fn ensure_room(&self, room_id: Uuid) -> Result<(), DomainError> {
        let exists = self
            .rooms
            .exists(room_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !exists {
            return Err(DomainError::room_not_found(room_id));
        }
        Ok(())
    }
}
