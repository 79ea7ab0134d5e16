//! Per-sign-in session lifecycle: profile bootstrap, role resolution and
//! the session-ready signal.

pub mod bootstrap;
pub mod context;
pub mod manager;
pub mod role_resolver;

pub use bootstrap::ProfileBootstrap;
pub use context::SessionContext;
pub use manager::{SessionManager, SessionState};
pub use role_resolver::{RoleResolver, RoleState};
