//! Upstream dialing
//!
//! Every client gets its own connection to the fixed upstream. The client's
//! identity travels in the `X-User-Id` header, alongside a configured `Origin`.

use crate::relay::ws::UpstreamSocket;
use relay_common::{UpstreamConfig, USER_ID_HEADER};
use relay_core::ClientId;
use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        client::IntoClientRequest,
        http::{header::ORIGIN, HeaderValue},
        Error as WsError,
    },
};

/// Upper bound on establishing the upstream connection
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// Upstream dial failures
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("Invalid upstream URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: WsError,
    },

    #[error("Invalid value for header {0}")]
    InvalidHeader(&'static str),

    #[error("Upstream handshake failed: {0}")]
    Handshake(#[source] WsError),

    #[error("Upstream did not answer within {0:?}")]
    Timeout(Duration),
}

/// Dial the upstream on behalf of `client_id`
pub async fn connect(
    config: &UpstreamConfig,
    client_id: &ClientId,
) -> Result<UpstreamSocket, UpstreamError> {
    let mut request = config
        .url
        .as_str()
        .into_client_request()
        .map_err(|source| UpstreamError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;

    let headers = request.headers_mut();
    headers.insert(
        USER_ID_HEADER,
        HeaderValue::from_str(client_id.as_str())
            .map_err(|_| UpstreamError::InvalidHeader(USER_ID_HEADER))?,
    );
    headers.insert(
        ORIGIN,
        HeaderValue::from_str(&config.origin).map_err(|_| UpstreamError::InvalidHeader("origin"))?,
    );

    let (socket, response) = tokio::time::timeout(DIAL_TIMEOUT, connect_async(request))
        .await
        .map_err(|_| UpstreamError::Timeout(DIAL_TIMEOUT))?
        .map_err(UpstreamError::Handshake)?;

    tracing::debug!(
        client_id = %client_id,
        url = %config.url,
        status = response.status().as_u16(),
        "Upstream connected"
    );

    Ok(socket)
}
