use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::WindowConfig;
use crate::contract::error::ReservationsError;
use crate::domain::error::DomainError;
use crate::domain::ports::TokenVerifier;
use crate::domain::service::Service;

/// Shared handler state, installed as a request extension.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<Service>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub mutation_timeout: Duration,
    pub default_window: WindowConfig,
}

impl ApiState {
    /// Run a service call under the mutation timeout and map its error to
    /// the contract error.
    pub async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, DomainError>>,
    ) -> Result<T, ReservationsError> {
        match tokio::time::timeout(self.mutation_timeout, fut).await {
            Ok(res) => res.map_err(ReservationsError::from),
            Err(_) => Err(ReservationsError::Timeout),
        }
    }
}
