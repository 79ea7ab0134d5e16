//! List controller against a scripted store: confirmation, timeouts and
//! reconciliation only after the store confirmed.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reservations::contract::model::{
    Actor, DashboardStats, Identity, NewReservation, Profile, Reservation, ReservationAction,
    ReservationFilter, ReservationPatch, ReservationStatus, Role, Room, TransitionResult,
};
use reservations::contract::{ReservationsApi, ReservationsError};
use reservations::controller::{ActionError, AlwaysConfirm, ConfirmPrompt, ReservationListController};
use uuid::Uuid;

/// In-memory store whose next mutation can be made to fail or stall.
#[derive(Default)]
struct ScriptedApi {
    rows: Mutex<Vec<Reservation>>,
    fail_next: AtomicBool,
    stall: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedApi {
    fn with(rows: Vec<Reservation>) -> Arc<Self> {
        Arc::new(Self {
            rows: Mutex::new(rows),
            ..Default::default()
        })
    }

    async fn gate(&self) -> Result<(), ReservationsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.stall.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ReservationsError::Internal);
        }
        Ok(())
    }

    fn set_status(&self, id: Uuid, status: ReservationStatus) -> TransitionResult {
        let mut rows = self.rows.lock().unwrap();
        let r = rows.iter_mut().find(|r| r.id == id).unwrap();
        let changed = r.status != status;
        r.status = status;
        TransitionResult {
            reservation: r.clone(),
            changed,
        }
    }
}

#[async_trait]
impl ReservationsApi for ScriptedApi {
    async fn list_reservations(
        &self,
        _filter: ReservationFilter,
    ) -> Result<Vec<Reservation>, ReservationsError> {
        self.gate().await?;
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn get_reservation(&self, id: Uuid) -> Result<Reservation, ReservationsError> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| ReservationsError::not_found("Reservation", id))
    }

    async fn create_reservation(
        &self,
        actor: &Actor,
        draft: NewReservation,
    ) -> Result<Reservation, ReservationsError> {
        self.gate().await?;
        let r = Reservation {
            id: Uuid::new_v4(),
            room_id: draft.room_id,
            user_id: actor.identity_id,
            title: draft.title,
            start_time: draft.start_time,
            end_time: draft.end_time,
            status: ReservationStatus::Pending,
            notes: draft.notes,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.rows.lock().unwrap().push(r.clone());
        Ok(r)
    }

    async fn approve_reservation(
        &self,
        _actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, ReservationsError> {
        self.gate().await?;
        Ok(self.set_status(id, ReservationStatus::Approved))
    }

    async fn reject_reservation(
        &self,
        _actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, ReservationsError> {
        self.gate().await?;
        Ok(self.set_status(id, ReservationStatus::Rejected))
    }

    async fn cancel_reservation(
        &self,
        _actor: &Actor,
        id: Uuid,
    ) -> Result<TransitionResult, ReservationsError> {
        self.gate().await?;
        Ok(self.set_status(id, ReservationStatus::Cancelled))
    }

    async fn update_reservation_fields(
        &self,
        _actor: &Actor,
        id: Uuid,
        patch: ReservationPatch,
    ) -> Result<Reservation, ReservationsError> {
        self.gate().await?;
        let mut rows = self.rows.lock().unwrap();
        let r = rows.iter_mut().find(|r| r.id == id).unwrap();
        patch.apply_to(r);
        Ok(r.clone())
    }

    async fn delete_reservation(&self, _actor: &Actor, id: Uuid) -> Result<(), ReservationsError> {
        self.gate().await?;
        self.rows.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn list_rooms(&self) -> Result<Vec<Room>, ReservationsError> {
        Ok(Vec::new())
    }

    async fn ensure_profile(&self, identity: &Identity) -> Result<Profile, ReservationsError> {
        Ok(Profile {
            id: identity.id,
            role: Some(Role::Student),
            email: Some(identity.email.clone()),
            created_at: Utc::now(),
        })
    }

    async fn resolve_actor(&self, identity: &Identity) -> Result<Actor, ReservationsError> {
        Ok(Actor::new(identity.id, Some(Role::Student)))
    }

    async fn dashboard_stats(&self, _actor: &Actor) -> Result<DashboardStats, ReservationsError> {
        Ok(DashboardStats::default())
    }
}

/// Always declines and remembers what it was asked.
#[derive(Default)]
struct Decline {
    asked: Mutex<Vec<ReservationAction>>,
}

#[async_trait]
impl ConfirmPrompt for Decline {
    async fn confirm(&self, action: ReservationAction, _reservation: &Reservation) -> bool {
        self.asked.lock().unwrap().push(action);
        false
    }
}

fn row(owner: Uuid, status: ReservationStatus, hour: u32) -> Reservation {
    let start = Utc.with_ymd_and_hms(2099, 1, 10, hour, 0, 0).unwrap();
    Reservation {
        id: Uuid::new_v4(),
        room_id: Uuid::new_v4(),
        user_id: owner,
        title: format!("Slot {hour}"),
        start_time: start,
        end_time: start + chrono::Duration::hours(1),
        status,
        notes: None,
        created_at: start,
        updated_at: start,
    }
}

fn controller(
    api: Arc<ScriptedApi>,
    confirm: Arc<dyn ConfirmPrompt>,
    actor: Actor,
) -> ReservationListController {
    ReservationListController::new(api, confirm, actor, Duration::from_millis(200))
}

#[tokio::test]
async fn load_replaces_and_failed_load_clears() {
    let owner = Uuid::new_v4();
    let api = ScriptedApi::with(vec![
        row(owner, ReservationStatus::Pending, 8),
        row(owner, ReservationStatus::Approved, 9),
    ]);
    let mut c = controller(
        api.clone(),
        Arc::new(AlwaysConfirm),
        Actor::new(owner, Some(Role::Student)),
    );

    assert_eq!(c.load(ReservationFilter::default()).await.unwrap().len(), 2);

    api.fail_next.store(true, Ordering::SeqCst);
    assert!(c.load(ReservationFilter::default()).await.is_err());
    assert!(c.reservations().is_empty());
}

#[tokio::test]
async fn staff_approve_reconciles_status_only() {
    let owner = Uuid::new_v4();
    let pending = row(owner, ReservationStatus::Pending, 8);
    let other = row(owner, ReservationStatus::Pending, 9);
    let api = ScriptedApi::with(vec![pending.clone(), other.clone()]);
    let decline = Arc::new(Decline::default());
    let mut c = controller(
        api,
        decline.clone(),
        Actor::new(Uuid::new_v4(), Some(Role::Staff)),
    );
    c.load(ReservationFilter::default()).await.unwrap();

    // Approve is not destructive, so no confirmation is requested.
    c.approve(pending.id).await.unwrap();
    assert!(decline.asked.lock().unwrap().is_empty());

    let expected = Reservation {
        status: ReservationStatus::Approved,
        ..pending
    };
    assert_eq!(c.reservations(), [expected, other]);
}

#[tokio::test]
async fn declined_confirmation_makes_no_call() {
    let owner = Uuid::new_v4();
    let pending = row(owner, ReservationStatus::Pending, 8);
    let api = ScriptedApi::with(vec![pending.clone()]);
    let decline = Arc::new(Decline::default());
    let mut c = controller(
        api.clone(),
        decline.clone(),
        Actor::new(owner, Some(Role::Student)),
    );
    c.load(ReservationFilter::default()).await.unwrap();
    let calls_after_load = api.calls.load(Ordering::SeqCst);

    let err = c.cancel(pending.id).await.unwrap_err();
    assert_eq!(err, ActionError::NotConfirmed(ReservationAction::Cancel));
    assert_eq!(*decline.asked.lock().unwrap(), [ReservationAction::Cancel]);
    assert_eq!(api.calls.load(Ordering::SeqCst), calls_after_load);
    assert_eq!(c.reservations()[0].status, ReservationStatus::Pending);
}

#[tokio::test]
async fn owner_cancel_reconciles_after_success() {
    let owner = Uuid::new_v4();
    let pending = row(owner, ReservationStatus::Pending, 8);
    let api = ScriptedApi::with(vec![pending.clone()]);
    let mut c = controller(
        api,
        Arc::new(AlwaysConfirm),
        Actor::new(owner, Some(Role::Student)),
    );
    c.load(ReservationFilter::default()).await.unwrap();

    assert_eq!(c.allowed_actions(pending.id), [ReservationAction::Cancel]);
    c.cancel(pending.id).await.unwrap();
    assert_eq!(c.reservations()[0].status, ReservationStatus::Cancelled);
    assert!(c.allowed_actions(pending.id).is_empty());
}

#[tokio::test]
async fn failed_call_leaves_the_list_untouched() {
    let owner = Uuid::new_v4();
    let approved = row(owner, ReservationStatus::Approved, 8);
    let api = ScriptedApi::with(vec![approved.clone()]);
    let mut c = controller(
        api.clone(),
        Arc::new(AlwaysConfirm),
        Actor::new(Uuid::new_v4(), Some(Role::Admin)),
    );
    c.load(ReservationFilter::default()).await.unwrap();
    let before = c.reservations().to_vec();

    api.fail_next.store(true, Ordering::SeqCst);
    let err = c.delete(approved.id).await.unwrap_err();
    assert_eq!(err, ActionError::Api(ReservationsError::Internal));
    assert_eq!(c.reservations(), before.as_slice());

    api.fail_next.store(true, Ordering::SeqCst);
    let patch = ReservationPatch {
        title: Some("Renamed".into()),
        ..Default::default()
    };
    assert!(c.edit(approved.id, patch.clone()).await.is_err());
    assert_eq!(c.reservations(), before.as_slice());

    c.edit(approved.id, patch).await.unwrap();
    assert_eq!(c.reservations()[0].title, "Renamed");

    c.delete(approved.id).await.unwrap();
    assert!(c.reservations().is_empty());
}

#[tokio::test]
async fn stalled_call_times_out_without_reconciling() {
    let owner = Uuid::new_v4();
    let pending = row(owner, ReservationStatus::Pending, 8);
    let api = ScriptedApi::with(vec![pending.clone()]);
    let mut c = controller(
        api.clone(),
        Arc::new(AlwaysConfirm),
        Actor::new(Uuid::new_v4(), Some(Role::Staff)),
    );
    c.load(ReservationFilter::default()).await.unwrap();

    api.stall.store(true, Ordering::SeqCst);
    let err = c.reject(pending.id).await.unwrap_err();
    assert_eq!(err, ActionError::Api(ReservationsError::Timeout));
    assert_eq!(c.reservations()[0].status, ReservationStatus::Pending);
}

#[tokio::test]
async fn local_gate_blocks_disallowed_actions() {
    let owner = Uuid::new_v4();
    let pending = row(owner, ReservationStatus::Pending, 8);
    let api = ScriptedApi::with(vec![pending.clone()]);
    let mut c = controller(
        api.clone(),
        Arc::new(AlwaysConfirm),
        Actor::new(Uuid::new_v4(), Some(Role::Student)),
    );
    c.load(ReservationFilter::default()).await.unwrap();
    let calls = api.calls.load(Ordering::SeqCst);

    // Someone else's reservation, and a student approving.
    assert!(matches!(
        c.cancel(pending.id).await,
        Err(ActionError::Api(ReservationsError::Forbidden { .. }))
    ));
    assert!(matches!(
        c.approve(pending.id).await,
        Err(ActionError::Api(ReservationsError::Forbidden { .. }))
    ));
    assert!(matches!(
        c.approve(Uuid::new_v4()).await,
        Err(ActionError::Api(ReservationsError::NotFound { .. }))
    ));
    assert_eq!(api.calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn create_goes_to_store_and_waits_for_reload() {
    let me = Uuid::new_v4();
    let api = ScriptedApi::with(Vec::new());
    let mut c = controller(
        api.clone(),
        Arc::new(AlwaysConfirm),
        Actor::new(me, Some(Role::Student)),
    );
    assert!(c.can_create());

    let start = Utc.with_ymd_and_hms(2099, 2, 1, 10, 0, 0).unwrap();
    let created = c
        .create(NewReservation {
            room_id: Uuid::new_v4(),
            title: "Study".into(),
            start_time: start,
            end_time: start + chrono::Duration::hours(2),
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(created.user_id, me);
    assert!(c.reservations().is_empty());

    c.load(ReservationFilter::default()).await.unwrap();
    assert_eq!(c.reservations().len(), 1);

    let staff = controller(api, Arc::new(AlwaysConfirm), Actor::new(me, Some(Role::Staff)));
    assert!(!staff.can_create());
}
