use async_trait::async_trait;

use crate::contract::model::{Reservation, ReservationAction};

/// Explicit confirmation step asked before a destructive mutation is issued.
#[async_trait]
pub trait ConfirmPrompt: Send + Sync {
    /// `false` aborts the action without touching the store.
    async fn confirm(&self, action: ReservationAction, reservation: &Reservation) -> bool;
}

/// Confirms everything. For non-interactive callers that already asked.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

#[async_trait]
impl ConfirmPrompt for AlwaysConfirm {
    async fn confirm(&self, _action: ReservationAction, _reservation: &Reservation) -> bool {
        true
    }
}
