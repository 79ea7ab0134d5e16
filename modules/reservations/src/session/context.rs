use crate::contract::model::{Actor, Identity, Profile, Role};

/// Identity and resolved role of one signed-in session.
///
/// Created on sign-in, dropped on sign-out, and passed explicitly to
/// whatever needs to act on behalf of the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    identity: Identity,
    profile: Profile,
}

impl SessionContext {
    pub fn new(identity: Identity, profile: Profile) -> Self {
        Self { identity, profile }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn role(&self) -> Option<Role> {
        self.profile.role
    }

    pub fn actor(&self) -> Actor {
        Actor::new(self.identity.id, self.profile.role)
    }
}
