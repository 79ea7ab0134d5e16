use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::{broadcast::error::RecvError, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::contract::model::{Identity, Profile};
use crate::domain::error::DomainError;
use crate::domain::ports::{AuthEvent, IdentityProvider};
use crate::domain::repo::ProfilesRepository;
use crate::session::bootstrap::ProfileBootstrap;
use crate::session::context::SessionContext;
use crate::session::role_resolver::RoleResolver;

/// Session-ready signal. Role-gated views render only in `Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Initializing,
    Ready(Arc<SessionContext>),
    SignedOut,
    /// Profile bootstrap failed; the session is not ready.
    Failed(String),
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready(_))
    }

    pub fn context(&self) -> Option<&Arc<SessionContext>> {
        match self {
            SessionState::Ready(ctx) => Some(ctx),
            _ => None,
        }
    }
}

/// Drives the session lifecycle from identity changes.
pub struct SessionManager {
    bootstrap: ProfileBootstrap,
    roles: RoleResolver,
    state: watch::Sender<SessionState>,
    current: ArcSwapOption<SessionContext>,
}

impl SessionManager {
    pub fn new(profiles: Arc<dyn ProfilesRepository>) -> Self {
        let (state, _) = watch::channel(SessionState::Initializing);
        Self {
            bootstrap: ProfileBootstrap::new(profiles.clone()),
            roles: RoleResolver::new(profiles),
            state,
            current: ArcSwapOption::empty(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Context of the signed-in user, if the session is ready.
    pub fn current(&self) -> Option<Arc<SessionContext>> {
        self.current.load_full()
    }

    pub fn roles(&self) -> &RoleResolver {
        &self.roles
    }

    /// Bootstrap the profile, then resolve the role, then publish `Ready`.
    #[instrument(
        name = "reservations.session.sign_in",
        skip(self, identity),
        fields(identity_id = %identity.id)
    )]
    pub async fn sign_in(&self, identity: Identity) -> Result<Arc<SessionContext>, DomainError> {
        self.current.store(None);
        self.roles.reset();
        self.state.send_replace(SessionState::Initializing);

        let profile = match self.bootstrap.ensure_profile(&identity).await {
            Ok(profile) => profile,
            Err(e) => {
                self.state.send_replace(SessionState::Failed(e.to_string()));
                return Err(e);
            }
        };

        let role_state = self.roles.resolve(identity.id).await;
        let profile = Profile {
            role: role_state.role,
            ..profile
        };

        let ctx = Arc::new(SessionContext::new(identity, profile));
        self.current.store(Some(ctx.clone()));
        self.state.send_replace(SessionState::Ready(ctx.clone()));
        info!(role = ?ctx.role(), "Session ready");
        Ok(ctx)
    }

    #[instrument(name = "reservations.session.sign_out", skip(self))]
    pub fn sign_out(&self) {
        self.current.store(None);
        self.roles.reset();
        self.state.send_replace(SessionState::SignedOut);
        info!("Session closed");
    }

    /// Follow `provider` until `cancel` fires or the event stream closes.
    pub async fn run(
        self: Arc<Self>,
        provider: Arc<dyn IdentityProvider>,
        cancel: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut events = provider.subscribe();
        self.sync_with(provider.as_ref()).await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Session manager cancelled");
                    break;
                }
                event = events.recv() => match event {
                    Ok(AuthEvent::SignedIn(identity)) => {
                        if let Err(e) = self.sign_in(identity).await {
                            warn!(error = %e, "Sign-in did not produce a ready session");
                        }
                    }
                    Ok(AuthEvent::SignedOut) => self.sign_out(),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Missed identity events, resyncing");
                        self.sync_with(provider.as_ref()).await;
                    }
                    Err(RecvError::Closed) => {
                        debug!("Identity stream closed");
                        break;
                    }
                },
            }
        }
        Ok(())
    }

    async fn sync_with(&self, provider: &dyn IdentityProvider) {
        match provider.current_identity() {
            Some(identity) => {
                if let Err(e) = self.sign_in(identity).await {
                    warn!(error = %e, "Sign-in did not produce a ready session");
                }
            }
            None => self.sign_out(),
        }
    }
}
