//! Client identity extractor
//!
//! Reads the caller-supplied identity from the `id` or `userId` query parameter,
//! falling back to the `X-User-Id` header. Requests without one are rejected
//! with 400 before any connection state is created.

use super::ApiError;
use axum::{async_trait, extract::FromRequestParts, extract::Query, http::request::Parts};
use relay_core::ClientId;
use serde::Deserialize;

/// Header carrying the caller identity, both inbound and towards the upstream
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Default, Deserialize)]
struct IdentityQuery {
    id: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

/// Identity supplied by the connecting client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub ClientId);

impl ClientIdentity {
    /// Resolve the identity from request parts
    pub fn from_parts(parts: &Parts) -> Result<Self, ApiError> {
        let query = Query::<IdentityQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();

        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let raw = [query.id, query.user_id, header]
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.trim().is_empty())
            .ok_or(ApiError::MissingClientId)?;

        ClientId::parse(raw)
            .map(Self)
            .map_err(ApiError::InvalidClientId)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts).inspect_err(|e| {
            tracing::debug!(uri = %parts.uri, error = %e, "Rejected connection without identity");
        })
    }
}
