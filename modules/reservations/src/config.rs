use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Configuration for the reservations module (`modules.reservations`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReservationsConfig {
    /// Upper bound for a single store mutation issued on behalf of a user.
    #[serde(default = "default_mutation_timeout", with = "humantime_serde")]
    pub mutation_timeout: Duration,
    #[serde(default = "default_max_title_length")]
    pub max_title_length: usize,
    #[serde(default)]
    pub default_window: WindowConfig,
    #[serde(default)]
    pub notifications: Option<NotificationsConfig>,
    /// Bearer token -> identity.
    #[serde(default)]
    pub api_tokens: HashMap<String, ApiTokenConfig>,
    /// Room names created at startup when missing.
    #[serde(default)]
    pub seed_rooms: Vec<String>,
}

impl Default for ReservationsConfig {
    fn default() -> Self {
        Self {
            mutation_timeout: default_mutation_timeout(),
            max_title_length: default_max_title_length(),
            default_window: WindowConfig::default(),
            notifications: None,
            api_tokens: HashMap::new(),
            seed_rooms: Vec::new(),
        }
    }
}

/// Calendar window around "now" used when a listing gives only one bound.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    #[serde(default = "default_months_back")]
    pub months_back: u32,
    #[serde(default = "default_months_forward")]
    pub months_forward: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            months_back: default_months_back(),
            months_forward: default_months_forward(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NotificationsConfig {
    /// Mail function URL.
    pub endpoint: String,
    /// Shared secret sent as bearer token.
    pub secret: String,
    #[serde(default = "default_notify_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ApiTokenConfig {
    pub id: Uuid,
    pub email: String,
}

fn default_mutation_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_max_title_length() -> usize {
    200
}

fn default_months_back() -> u32 {
    3
}

fn default_months_forward() -> u32 {
    6
}

fn default_notify_timeout() -> Duration {
    Duration::from_secs(10)
}
