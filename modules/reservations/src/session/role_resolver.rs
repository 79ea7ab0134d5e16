use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::contract::model::Role;
use crate::domain::repo::ProfilesRepository;

/// Observable role of the current identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleState {
    pub role: Option<Role>,
    /// True until the role record has been fetched.
    pub loading: bool,
}

impl RoleState {
    pub const LOADING: RoleState = RoleState {
        role: None,
        loading: true,
    };

    pub const NO_ROLE: RoleState = RoleState {
        role: None,
        loading: false,
    };

    pub fn resolved(role: Option<Role>) -> Self {
        Self {
            role,
            loading: false,
        }
    }
}

/// Maps an identity to its role and publishes the result on a watch channel.
pub struct RoleResolver {
    profiles: Arc<dyn ProfilesRepository>,
    state: watch::Sender<RoleState>,
}

impl RoleResolver {
    pub fn new(profiles: Arc<dyn ProfilesRepository>) -> Self {
        let (state, _) = watch::channel(RoleState::LOADING);
        Self { profiles, state }
    }

    pub fn subscribe(&self) -> watch::Receiver<RoleState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> RoleState {
        *self.state.borrow()
    }

    /// Fetch the role record of `identity_id`.
    ///
    /// Missing records and read failures both resolve to "no role", which
    /// grants nothing.
    #[instrument(name = "reservations.session.resolve_role", skip(self))]
    pub async fn resolve(&self, identity_id: Uuid) -> RoleState {
        self.state.send_replace(RoleState::LOADING);

        let resolved = match self.profiles.find_by_id(identity_id).await {
            Ok(Some(profile)) => {
                debug!(role = ?profile.role, "Role resolved");
                RoleState::resolved(profile.role)
            }
            Ok(None) => {
                warn!("No role record for identity");
                RoleState::NO_ROLE
            }
            Err(e) => {
                warn!(error = %e, "Role lookup failed, granting nothing");
                RoleState::NO_ROLE
            }
        };

        self.state.send_replace(resolved);
        resolved
    }

    /// Back to the unresolved state, as after sign-out.
    pub fn reset(&self) {
        self.state.send_replace(RoleState::LOADING);
    }
}
