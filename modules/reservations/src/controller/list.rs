//! Client-side list of reservations for one view.
//!
//! Local state is only touched after the remote call has succeeded. On
//! failure the collection stays as it was and the error goes to the caller.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::contract::{
    model::{
        Actor, NewReservation, Reservation, ReservationAction, ReservationFilter,
        ReservationPatch, ReservationStatus,
    },
    ReservationsApi, ReservationsError,
};
use crate::controller::confirm::ConfirmPrompt;
use crate::domain::permissions::{self, authorize, Decision};

/// Ordered snapshot collection with the four reconciliation mutators.
///
/// Order is the store's (`start_time` ascending) and is never changed by a
/// local patch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationList {
    items: Vec<Reservation>,
}

impl ReservationList {
    pub fn new(items: Vec<Reservation>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Reservation] {
        &self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&Reservation> {
        self.items.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn replace(&mut self, items: Vec<Reservation>) {
        self.items = items;
    }

    fn clear(&mut self) {
        self.items.clear();
    }

    /// Sets `status` to `cancelled` and nothing else.
    pub fn apply_cancel(&mut self, id: Uuid) -> bool {
        self.apply_status_change(id, ReservationStatus::Cancelled)
    }

    pub fn apply_status_change(&mut self, id: Uuid, status: ReservationStatus) -> bool {
        match self.items.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                r.status = status;
                true
            }
            None => false,
        }
    }

    /// Removes the entry. Unknown ids leave the list unchanged.
    pub fn apply_delete(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|r| r.id != id);
        self.items.len() != before
    }

    /// Merges title / room / time window into the entry.
    pub fn apply_field_update(&mut self, id: Uuid, updates: &ReservationPatch) -> bool {
        match self.items.iter_mut().find(|r| r.id == id) {
            Some(r) => {
                updates.apply_to(r);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    #[error("Action '{0}' was not confirmed")]
    NotConfirmed(ReservationAction),

    #[error(transparent)]
    Api(#[from] ReservationsError),
}

/// Owns the list of one view and issues user actions against the store.
pub struct ReservationListController {
    api: Arc<dyn ReservationsApi>,
    confirm: Arc<dyn ConfirmPrompt>,
    actor: Actor,
    timeout: Duration,
    list: ReservationList,
}

impl ReservationListController {
    pub fn new(
        api: Arc<dyn ReservationsApi>,
        confirm: Arc<dyn ConfirmPrompt>,
        actor: Actor,
        timeout: Duration,
    ) -> Self {
        Self {
            api,
            confirm,
            actor,
            timeout,
            list: ReservationList::default(),
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn reservations(&self) -> &[Reservation] {
        self.list.items()
    }

    pub fn list(&self) -> &ReservationList {
        &self.list
    }

    /// Replace the whole collection. A failed fetch leaves it empty.
    pub async fn load(
        &mut self,
        filter: ReservationFilter,
    ) -> Result<&[Reservation], ReservationsError> {
        let api = self.api.clone();
        match self.bounded(api.list_reservations(filter)).await {
            Ok(items) => {
                debug!("Loaded {} reservations", items.len());
                self.list.replace(items);
                Ok(self.list.items())
            }
            Err(e) => {
                warn!(error = %e, "Reservation fetch failed");
                self.list.clear();
                Err(e)
            }
        }
    }

    pub fn apply_cancel(&mut self, id: Uuid) -> bool {
        self.list.apply_cancel(id)
    }

    pub fn apply_status_change(&mut self, id: Uuid, status: ReservationStatus) -> bool {
        self.list.apply_status_change(id, status)
    }

    pub fn apply_delete(&mut self, id: Uuid) -> bool {
        self.list.apply_delete(id)
    }

    pub fn apply_field_update(&mut self, id: Uuid, updates: &ReservationPatch) -> bool {
        self.list.apply_field_update(id, updates)
    }

    /// Controls a view may offer for entry `id`.
    pub fn allowed_actions(&self, id: Uuid) -> Vec<ReservationAction> {
        self.list
            .get(id)
            .map(|r| permissions::allowed_actions(&self.actor, r))
            .unwrap_or_default()
    }

    pub fn can_create(&self) -> bool {
        authorize(&self.actor, ReservationAction::Create, None).is_allowed()
    }

    pub async fn approve(&mut self, id: Uuid) -> Result<(), ActionError> {
        self.gate(id, ReservationAction::Approve).await?;
        let (api, actor) = (self.api.clone(), self.actor);
        let result = self.bounded(api.approve_reservation(&actor, id)).await?;
        self.apply_status_change(id, result.reservation.status);
        info!(reservation_id = %id, changed = result.changed, "Approved");
        Ok(())
    }

    pub async fn reject(&mut self, id: Uuid) -> Result<(), ActionError> {
        self.gate(id, ReservationAction::Reject).await?;
        let (api, actor) = (self.api.clone(), self.actor);
        let result = self.bounded(api.reject_reservation(&actor, id)).await?;
        self.apply_status_change(id, result.reservation.status);
        info!(reservation_id = %id, changed = result.changed, "Rejected");
        Ok(())
    }

    pub async fn cancel(&mut self, id: Uuid) -> Result<(), ActionError> {
        self.gate(id, ReservationAction::Cancel).await?;
        let (api, actor) = (self.api.clone(), self.actor);
        self.bounded(api.cancel_reservation(&actor, id)).await?;
        self.apply_cancel(id);
        info!(reservation_id = %id, "Cancelled");
        Ok(())
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<(), ActionError> {
        self.gate(id, ReservationAction::Delete).await?;
        let (api, actor) = (self.api.clone(), self.actor);
        self.bounded(api.delete_reservation(&actor, id)).await?;
        self.apply_delete(id);
        info!(reservation_id = %id, "Deleted");
        Ok(())
    }

    pub async fn edit(&mut self, id: Uuid, updates: ReservationPatch) -> Result<(), ActionError> {
        self.gate(id, ReservationAction::EditFields).await?;
        let (api, actor) = (self.api.clone(), self.actor);
        let stored = self
            .bounded(api.update_reservation_fields(&actor, id, updates))
            .await?;
        // Reconcile with what the store persisted, not with the raw input.
        let persisted = ReservationPatch {
            title: Some(stored.title),
            room_id: Some(stored.room_id),
            start_time: Some(stored.start_time),
            end_time: Some(stored.end_time),
        };
        self.apply_field_update(id, &persisted);
        info!(reservation_id = %id, "Fields updated");
        Ok(())
    }

    /// Submit a new request. The list picks it up on the next `load`.
    pub async fn create(&mut self, draft: NewReservation) -> Result<Reservation, ActionError> {
        if let Decision::Deny(reason) = authorize(&self.actor, ReservationAction::Create, None) {
            let denied = ReservationsError::forbidden(ReservationAction::Create, reason.to_string());
            return Err(denied.into());
        }
        let (api, actor) = (self.api.clone(), self.actor);
        let created = self.bounded(api.create_reservation(&actor, draft)).await?;
        info!(reservation_id = %created.id, "Reservation submitted");
        Ok(created)
    }

    /// Local permission check, then confirmation for destructive actions.
    async fn gate(&self, id: Uuid, action: ReservationAction) -> Result<(), ActionError> {
        let reservation = self
            .list
            .get(id)
            .ok_or_else(|| ReservationsError::not_found("Reservation", id))?;

        if let Decision::Deny(reason) = authorize(&self.actor, action, Some(reservation)) {
            return Err(ReservationsError::forbidden(action, reason.to_string()).into());
        }

        if action.is_destructive() && !self.confirm.confirm(action, reservation).await {
            debug!(reservation_id = %id, %action, "Action not confirmed");
            return Err(ActionError::NotConfirmed(action));
        }
        Ok(())
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, ReservationsError>>,
    ) -> Result<T, ReservationsError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| ReservationsError::Timeout)?
    }
}
