//! Order book server endpoint configuration.

use std::env;

/// Base URL of the control, snapshot and assertion endpoints.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:9090";

/// WebSocket URL of the binary delta feed.
pub const DEFAULT_FEED_URL: &str = "ws://localhost:9091/delta";

const SERVER_URL_VAR: &str = "ORDER_BOOK_SERVER_URL";
const FEED_URL_VAR: &str = "ORDER_BOOK_FEED_URL";

/// Where the order book server and its delta feed live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// HTTP base URL, without trailing slash.
    pub server_url: String,
    /// WebSocket URL of the delta stream.
    pub feed_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL, DEFAULT_FEED_URL)
    }
}

impl Endpoints {
    pub fn new(server_url: impl Into<String>, feed_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            feed_url: feed_url.into(),
        }
    }

    /// Load endpoints from `ORDER_BOOK_SERVER_URL` / `ORDER_BOOK_FEED_URL`.
    ///
    /// Unset or blank variables fall back to the localhost defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let pick = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self::new(
            pick(SERVER_URL_VAR, DEFAULT_SERVER_URL),
            pick(FEED_URL_VAR, DEFAULT_FEED_URL),
        )
    }
}
