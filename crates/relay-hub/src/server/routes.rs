//! Plain HTTP routes of the hub

use crate::server::HubState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use relay_common::{ApiResult, AppError};
use relay_core::IceServerList;
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub clients: usize,
}

/// Health check endpoint
pub async fn health_check(State(state): State<HubState>) -> Json<HealthResponse> {
    let clients = state.registry().client_count().await.unwrap_or_default();
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "relay-hub".to_string(),
        clients,
    })
}

/// Configured STUN/TURN servers
pub async fn ice_servers(State(state): State<HubState>) -> Json<IceServerList> {
    Json(state.ice_servers().list().clone())
}

#[derive(Debug, Deserialize)]
pub struct CredentialsQuery {
    pub role: Option<String>,
}

/// Forward a TURN credential request to the configured issuer
///
/// The caller's `Authorization` header is passed through unchanged and the
/// issuer's status and body are returned as they are.
pub async fn turn_credentials(
    State(state): State<HubState>,
    Query(query): Query<CredentialsQuery>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let url = state
        .config()
        .credentials
        .upstream_url
        .as_deref()
        .ok_or(AppError::UpstreamNotConfigured("TURN_CREDENTIALS_URL"))?;

    let mut request = state.http_client().get(url);
    if let Some(role) = &query.role {
        request = request.query(&[("role", role)]);
    }
    if let Some(authorization) = headers.get(header::AUTHORIZATION) {
        request = request.header(header::AUTHORIZATION, authorization.clone());
    }

    let upstream = request.send().await.map_err(|e| {
        tracing::warn!(error = %e, "TURN credential issuer unreachable");
        AppError::upstream(e)
    })?;

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let body: Bytes = upstream.bytes().await.map_err(AppError::upstream)?;

    tracing::debug!(status = status.as_u16(), role = ?query.role, "TURN credentials forwarded");

    let mut response = (status, body).into_response();
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type);
    }
    Ok(response)
}
