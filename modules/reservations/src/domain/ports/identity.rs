use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::contract::model::Identity;

/// Identity change emitted by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

/// Authentication boundary: current identity plus a stream of changes.
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Maps a bearer token to the identity it was issued for.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// `None` for unknown or malformed tokens.
    async fn verify(&self, token: &str) -> Option<Identity>;
}
