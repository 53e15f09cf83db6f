//! Delta feed transport.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::ConnectorError;

/// Timeout for WebSocket connection attempts.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// A reconnectable source of binary delta frames.
///
/// One `connect` starts a session; `next_frame` yields payloads until the
/// session ends with `None` (clean close) or an error.
#[async_trait]
pub trait DeltaFeed: Send {
    /// Open a new session, replacing any previous one.
    async fn connect(&mut self) -> Result<(), ConnectorError>;

    /// Next binary payload of the current session.
    ///
    /// Must be cancel safe: it is polled inside `tokio::select!`.
    async fn next_frame(&mut self) -> Option<Result<Vec<u8>, ConnectorError>>;

    /// Close the current session, if any.
    async fn close(&mut self);
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Delta feed over a WebSocket carrying binary frames.
pub struct WebSocketFeed {
    url: String,
    connect_timeout: Duration,
    stream: Option<WsStream>,
}

impl WebSocketFeed {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: CONNECTION_TIMEOUT,
            stream: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}

#[async_trait]
impl DeltaFeed for WebSocketFeed {
    async fn connect(&mut self) -> Result<(), ConnectorError> {
        self.stream = None;
        info!(url = %self.url, "Connecting to delta feed");

        match tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str())).await {
            Ok(Ok((stream, _))) => {
                info!("Delta feed connected");
                self.stream = Some(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(ConnectorError::WebSocket(e.to_string())),
            Err(_) => Err(ConnectorError::WebSocket("connection timeout".to_string())),
        }
    }

    async fn next_frame(&mut self) -> Option<Result<Vec<u8>, ConnectorError>> {
        let Some(stream) = self.stream.as_mut() else {
            return Some(Err(ConnectorError::NotConnected));
        };

        let ended = loop {
            match stream.next().await {
                Some(Ok(Message::Binary(data))) => return Some(Ok(data)),
                Some(Ok(Message::Ping(data))) => {
                    // Keepalive
                    debug!("Received Ping, sending Pong");
                    if let Err(e) = stream.send(Message::Pong(data)).await {
                        break Some(Err(ConnectorError::WebSocket(e.to_string())));
                    }
                }
                Some(Ok(Message::Text(text))) => {
                    warn!(len = text.len(), "Ignoring text frame on binary delta feed");
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(frame = ?frame, "Delta feed closed by server");
                    break None;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => break Some(Err(ConnectorError::WebSocket(e.to_string()))),
                None => break None,
            }
        };

        self.stream = None;
        ended
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.close(None).await;
            info!(url = %self.url, "Delta feed closed");
        }
    }
}
