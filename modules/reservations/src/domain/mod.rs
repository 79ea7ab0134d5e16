pub mod error;
pub mod events;
pub mod permissions;
pub mod ports;
pub mod repo;
pub mod service;
pub mod state_machine;
