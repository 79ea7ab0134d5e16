#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use uuid::Uuid;

use reservations::contract::model::{Actor, Identity, NewReservation, Profile, Role, Room};
use reservations::domain::events::ReservationEvent;
use reservations::domain::ports::{EventPublisher, StatusChangeEvent, StatusNotifier};
use reservations::domain::repo::RoomsRepository;
use reservations::domain::service::{Repositories, Service, ServiceConfig};
use reservations::infra::storage::{
    SeaOrmProfilesRepository, SeaOrmReservationsRepository, SeaOrmRoomsRepository,
};
use reservations::Reservations;

/// Fresh migrated in-memory database. One connection, so every query sees
/// the same memory database.
pub async fn memory_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.expect("connect sqlite");
    Reservations::migrate(&db).await.expect("migrate");
    db
}

pub fn repositories(db: &DatabaseConnection) -> Repositories {
    Repositories {
        reservations: Arc::new(SeaOrmReservationsRepository::new(db.clone())),
        rooms: Arc::new(SeaOrmRoomsRepository::new(db.clone())),
        profiles: Arc::new(SeaOrmProfilesRepository::new(db.clone())),
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<StatusChangeEvent>>,
}

impl RecordingNotifier {
    pub fn subjects(&self) -> Vec<&'static str> {
        self.sent.lock().unwrap().iter().map(|e| e.subject()).collect()
    }

    /// Deliveries run on a background task; wait until `n` have arrived.
    pub async fn wait_for(&self, n: usize) -> Vec<&'static str> {
        for _ in 0..200 {
            if self.sent.lock().unwrap().len() >= n {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        self.subjects()
    }
}

#[async_trait]
impl StatusNotifier for RecordingNotifier {
    async fn notify(&self, event: &StatusChangeEvent) -> anyhow::Result<()> {
        self.sent.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<ReservationEvent>>,
}

impl EventPublisher<ReservationEvent> for RecordingPublisher {
    fn publish(&self, event: &ReservationEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub struct Harness {
    pub db: DatabaseConnection,
    pub repos: Repositories,
    pub service: Arc<Service>,
    pub notifier: Arc<RecordingNotifier>,
    pub events: Arc<RecordingPublisher>,
    pub room: Room,
}

impl Harness {
    pub async fn new() -> Self {
        let db = memory_db().await;
        let repos = repositories(&db);
        let notifier = Arc::new(RecordingNotifier::default());
        let events = Arc::new(RecordingPublisher::default());
        let service = Arc::new(Service::new(
            repos.clone(),
            notifier.clone(),
            events.clone(),
            ServiceConfig::default(),
        ));
        let room = repos.rooms.ensure("Room A").await.expect("seed room");
        Self {
            db,
            repos,
            service,
            notifier,
            events,
            room,
        }
    }

    /// Signs in a new identity; the profile bootstrap makes it a student.
    pub async fn student(&self, email: &str) -> (Identity, Actor) {
        let identity = identity(email);
        let actor = self
            .service
            .resolve_actor(&identity)
            .await
            .expect("resolve student");
        assert_eq!(actor.role, Some(Role::Student));
        (identity, actor)
    }

    /// Inserts a profile with `role` directly; role administration is external.
    pub async fn member(&self, email: &str, role: Role) -> (Identity, Actor) {
        let identity = identity(email);
        self.repos
            .profiles
            .insert(&Profile {
                id: identity.id,
                role: Some(role),
                email: Some(email.to_string()),
                created_at: Utc::now(),
            })
            .await
            .expect("insert profile");
        let actor = self
            .service
            .resolve_actor(&identity)
            .await
            .expect("resolve member");
        (identity, actor)
    }

    pub fn draft(&self, title: &str, start: DateTime<Utc>) -> NewReservation {
        NewReservation {
            room_id: self.room.id,
            title: title.to_string(),
            start_time: start,
            end_time: start + Duration::hours(1),
            notes: None,
        }
    }
}

/// Let spawned background work run before asserting on its absence.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
}

pub fn identity(email: &str) -> Identity {
    Identity {
        id: Uuid::new_v4(),
        email: email.to_string(),
    }
}

/// Fixed slot in the future.
pub fn slot(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2099, 3, day, hour, 0, 0).unwrap()
}
