use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument};

use crate::contract::model::{Identity, Profile, Role};
use crate::domain::error::DomainError;
use crate::domain::repo::ProfilesRepository;

/// Ensures a role record exists for an authenticated identity.
#[derive(Clone)]
pub struct ProfileBootstrap {
    profiles: Arc<dyn ProfilesRepository>,
}

impl ProfileBootstrap {
    pub fn new(profiles: Arc<dyn ProfilesRepository>) -> Self {
        Self { profiles }
    }

    /// Return the existing profile, or create one with the `student` role.
    ///
    /// A missing row is the expected first-login case. Any other read
    /// failure, and any insert failure that a re-read cannot explain, is a
    /// setup failure.
    #[instrument(
        name = "reservations.session.ensure_profile",
        skip(self, identity),
        fields(identity_id = %identity.id)
    )]
    pub async fn ensure_profile(&self, identity: &Identity) -> Result<Profile, DomainError> {
        match self.profiles.find_by_id(identity.id).await {
            Ok(Some(existing)) => {
                debug!("Profile already present");
                return Ok(existing);
            }
            Ok(None) => debug!("No profile yet, creating default"),
            Err(e) => {
                error!(error = %e, "Profile lookup failed");
                return Err(DomainError::profile_setup(e.to_string()));
            }
        }

        let profile = Profile {
            id: identity.id,
            role: Some(Role::Student),
            email: Some(identity.email.trim().to_string()).filter(|e| !e.is_empty()),
            created_at: Utc::now(),
        };

        if let Err(insert_err) = self.profiles.insert(&profile).await {
            // Lost a race with a concurrent sign-in for the same identity.
            return match self.profiles.find_by_id(identity.id).await {
                Ok(Some(existing)) => {
                    debug!("Profile created concurrently, using stored row");
                    Ok(existing)
                }
                Ok(None) | Err(_) => {
                    error!(error = %insert_err, "Profile insert failed");
                    Err(DomainError::profile_setup(insert_err.to_string()))
                }
            };
        }

        info!("Created student profile");
        Ok(profile)
    }
}
