use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info};
use url::Url;

use crate::api::rest::{routes, state::ApiState};
use crate::config::ReservationsConfig;
use crate::contract::client::ReservationsApi;
use crate::contract::model::Identity;
use crate::domain::events::ReservationEvent;
use crate::domain::ports::{EventPublisher, NoopNotifier, StatusNotifier, TokenVerifier};
use crate::domain::repo::RoomsRepository;
use crate::domain::service::{Repositories, Service, ServiceConfig};
use crate::gateways::local::ReservationsLocalClient;
use crate::infra::auth::StaticTokenVerifier;
use crate::infra::notify::{HttpStatusNotifier, NotificationDispatcher};
use crate::infra::storage::{
    migrations::Migrator, SeaOrmProfilesRepository, SeaOrmReservationsRepository,
    SeaOrmRoomsRepository,
};
use crate::session::SessionManager;

/// Publishes domain events to the log.
struct TracingEventPublisher;

impl EventPublisher<ReservationEvent> for TracingEventPublisher {
    fn publish(&self, event: &ReservationEvent) {
        debug!(reservation_id = %event.reservation_id(), ?event, "Reservation event");
    }
}

/// Wired reservations module: domain service plus its REST surface.
#[derive(Clone)]
pub struct Reservations {
    service: Arc<Service>,
    repos: Repositories,
    verifier: Arc<dyn TokenVerifier>,
    config: ReservationsConfig,
}

impl Reservations {
    /// Run schema migrations.
    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running reservations database migrations");
        Migrator::up(db, None).await?;
        info!("Reservations database migrations completed successfully");
        Ok(())
    }

    /// Wire repositories, notifier and service over `db`, then seed rooms.
    pub async fn init(db: DatabaseConnection, cfg: ReservationsConfig) -> anyhow::Result<Self> {
        info!("Initializing reservations module");
        debug!(
            "Loaded reservations config: mutation_timeout={:?}, max_title_length={}",
            cfg.mutation_timeout, cfg.max_title_length
        );

        let repos = Repositories {
            reservations: Arc::new(SeaOrmReservationsRepository::new(db.clone())),
            rooms: Arc::new(SeaOrmRoomsRepository::new(db.clone())),
            profiles: Arc::new(SeaOrmProfilesRepository::new(db)),
        };

        let notifier = build_notifier(&cfg)?;
        let service = Service::new(
            repos.clone(),
            notifier,
            Arc::new(TracingEventPublisher),
            ServiceConfig {
                max_title_length: cfg.max_title_length,
            },
        );

        seed_rooms(repos.rooms.as_ref(), &cfg.seed_rooms).await?;

        let tokens: HashMap<String, Identity> = cfg
            .api_tokens
            .iter()
            .map(|(token, t)| {
                (
                    token.clone(),
                    Identity {
                        id: t.id,
                        email: t.email.clone(),
                    },
                )
            })
            .collect();
        info!("Loaded {} API tokens", tokens.len());

        Ok(Self {
            service: Arc::new(service),
            repos,
            verifier: Arc::new(StaticTokenVerifier::new(tokens)),
            config: cfg,
        })
    }

    /// Swap the token verifier, e.g. for an external identity provider.
    pub fn with_verifier(mut self, verifier: Arc<dyn TokenVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn service(&self) -> Arc<Service> {
        self.service.clone()
    }

    pub fn config(&self) -> &ReservationsConfig {
        &self.config
    }

    /// In-process client for views and other modules.
    pub fn client(&self) -> Arc<dyn ReservationsApi> {
        Arc::new(ReservationsLocalClient::new(self.service.clone()))
    }

    /// Session manager backed by the same profile store.
    pub fn session_manager(&self) -> Arc<SessionManager> {
        Arc::new(SessionManager::new(self.repos.profiles.clone()))
    }

    pub fn router(&self) -> Router {
        info!("Registering reservations REST routes");
        let state = Arc::new(ApiState {
            service: self.service.clone(),
            verifier: self.verifier.clone(),
            mutation_timeout: self.config.mutation_timeout,
            default_window: self.config.default_window,
        });
        routes::register_routes(Router::new(), state)
    }
}

fn build_notifier(cfg: &ReservationsConfig) -> anyhow::Result<Arc<dyn StatusNotifier>> {
    let Some(n) = &cfg.notifications else {
        info!("No notification endpoint configured, status mails disabled");
        return Ok(Arc::new(NoopNotifier));
    };
    let endpoint = Url::parse(&n.endpoint)
        .with_context(|| format!("invalid notifications.endpoint '{}'", n.endpoint))?;
    info!(%endpoint, "Status notifications enabled");
    let http = HttpStatusNotifier::new(endpoint, n.secret.clone(), n.timeout)?;
    Ok(Arc::new(NotificationDispatcher::new(Arc::new(http))))
}

/// Create every named room that does not exist yet.
pub async fn seed_rooms(rooms: &dyn RoomsRepository, names: &[String]) -> anyhow::Result<()> {
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
        let room = rooms
            .ensure(name)
            .await
            .with_context(|| format!("seeding room '{name}'"))?;
        debug!(room_id = %room.id, name, "Room ready");
    }
    Ok(())
}
