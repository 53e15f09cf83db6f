use book_server::BookServerError;
use thiserror::Error;

/// Delta feed transport errors. All of them are recoverable by reconnecting.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Feed not connected")]
    NotConnected,
}

/// Failures that abort a sync run before streaming begins.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to start order book server: {0}")]
    Start(#[source] BookServerError),

    #[error("failed to load order book snapshot: {0}")]
    Snapshot(#[source] BookServerError),
}
