pub mod identity;
pub mod notifier;

pub use identity::{AuthEvent, IdentityProvider, TokenVerifier};
pub use notifier::{NoopNotifier, StatusChangeEvent, StatusNotifier};

/// Output port: publish domain events (no knowledge of transport).
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}

