// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::Reservations;

// === INTERNAL MODULES ===
// Exposed for the server binary and for tests. Other crates should stick to
// `contract` and the view-side `controller` / `session` types.
pub mod api;
pub mod config;
pub mod controller;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod gateways;
#[doc(hidden)]
pub mod infra;
pub mod session;
