pub mod client;
pub mod error;
pub mod model;

pub use client::ReservationsApi;
pub use error::ReservationsError;
pub use model::*;
