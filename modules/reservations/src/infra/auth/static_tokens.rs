use std::collections::HashMap;

use async_trait::async_trait;

use crate::contract::model::Identity;
use crate::domain::ports::TokenVerifier;

/// Token table loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, Identity>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, Identity>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Option<Identity> {
        self.tokens.get(token.trim()).cloned()
    }
}
