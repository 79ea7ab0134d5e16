use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::contract::model::Identity;
use crate::domain::ports::{AuthEvent, IdentityProvider};

/// In-process identity provider driven by the embedding shell.
pub struct ChannelIdentityProvider {
    current: ArcSwapOption<Identity>,
    events: broadcast::Sender<AuthEvent>,
}

impl ChannelIdentityProvider {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            current: ArcSwapOption::empty(),
            events,
        }
    }

    pub fn sign_in(&self, identity: Identity) {
        debug!(identity_id = %identity.id, "Identity signed in");
        self.current.store(Some(Arc::new(identity.clone())));
        // No subscribers is fine; the current identity is still recorded.
        let _ = self.events.send(AuthEvent::SignedIn(identity));
    }

    pub fn sign_out(&self) {
        debug!("Identity signed out");
        self.current.store(None);
        let _ = self.events.send(AuthEvent::SignedOut);
    }
}

impl Default for ChannelIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for ChannelIdentityProvider {
    fn current_identity(&self) -> Option<Identity> {
        self.current.load_full().map(|i| (*i).clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
