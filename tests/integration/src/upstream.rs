//! Fake upstream for proxy tests
//!
//! Accepts WebSocket connections, records the identity headers the proxy sent
//! and hands each connection to the test to drive.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{
    accept_hdr_async,
    tungstenite::handshake::server::{ErrorResponse, Request, Response},
    WebSocketStream,
};

/// One connection accepted by the fake upstream
pub struct UpstreamPeer {
    pub user_id: Option<String>,
    pub origin: Option<String>,
    pub socket: WebSocketStream<TcpStream>,
}

/// WebSocket server standing in for the proxied backend
pub struct FakeUpstream {
    pub addr: SocketAddr,
    peers: mpsc::UnboundedReceiver<UpstreamPeer>,
    _handle: JoinHandle<()>,
}

impl FakeUpstream {
    pub async fn start() -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, peers) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut seen = (None, None);
                    let callback = |request: &Request, response: Response| {
                        let header = |name: &str| {
                            request
                                .headers()
                                .get(name)
                                .and_then(|v| v.to_str().ok())
                                .map(String::from)
                        };
                        seen = (header("x-user-id"), header("origin"));
                        Ok::<_, ErrorResponse>(response)
                    };
                    if let Ok(socket) = accept_hdr_async(stream, callback).await {
                        let (user_id, origin) = seen;
                        let _ = tx.send(UpstreamPeer {
                            user_id,
                            origin,
                            socket,
                        });
                    }
                });
            }
        });

        Ok(Self {
            addr,
            peers,
            _handle: handle,
        })
    }

    pub fn url(&self) -> String {
        format!("ws://{}/communication/v1/ws", self.addr)
    }

    /// Next connection the proxy opened
    pub async fn accept(&mut self) -> Result<UpstreamPeer> {
        tokio::time::timeout(Duration::from_secs(3), self.peers.recv())
            .await
            .context("proxy did not dial the upstream")?
            .context("fake upstream stopped")
    }
}
