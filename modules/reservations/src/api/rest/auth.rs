use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, error};

use crate::api::rest::error::{map_error, unauthenticated};
use crate::api::rest::problem::ProblemResponse;
use crate::api::rest::state::ApiState;
use crate::contract::error::ReservationsError;
use crate::contract::model::{Actor, Identity};

/// Caller identity from the bearer token, with the role resolved
/// server-side from the profile store. Clients never supply a role.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub identity: Identity,
    pub actor: Actor,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(token.trim())
}

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let instance = parts.uri.path().to_string();

        let Some(state) = parts.extensions.get::<Arc<ApiState>>().cloned() else {
            error!("ApiState extension missing");
            return Err(map_error(&ReservationsError::Internal, &instance));
        };

        let Some(token) = bearer_token(parts) else {
            debug!("Missing or malformed bearer token");
            return Err(unauthenticated(&instance));
        };

        let Some(identity) = state.verifier.verify(token).await else {
            debug!("Unknown bearer token");
            return Err(unauthenticated(&instance));
        };

        let actor = state
            .call(state.service.resolve_actor(&identity))
            .await
            .map_err(|e| map_error(&e, &instance))?;

        Ok(Self { identity, actor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/me");
        if let Some(v) = auth {
            builder = builder.header(AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn bearer_token_parsing() {
        assert_eq!(bearer_token(&parts_with(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("bearer  abc "))), Some("abc"));
        assert_eq!(bearer_token(&parts_with(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts_with(None)), None);
    }
}
