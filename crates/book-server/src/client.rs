//! HTTP client for the order book server.

use async_trait::async_trait;
use model::{BookSnapshot, BookView};
use rest_client::{RestClient, RestError};
use std::time::Duration;

use crate::error::BookServerError;
use crate::responses::SnapshotResponse;
use crate::{BookServer, Verdict};

/// Request timeout for order book server calls.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const START_PATH: &str = "/start";
const SNAPSHOT_PATH: &str = "/snapshot";
const ASSERTION_PATH: &str = "/assertion";

/// Typed client for `/start`, `/snapshot` and `/assertion`.
#[derive(Debug, Clone)]
pub struct BookServerClient {
    client: RestClient,
}

impl BookServerClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BookServerError> {
        Ok(Self {
            client: RestClient::new(base_url, timeout)?,
        })
    }

    /// Create a client with [`REQUEST_TIMEOUT`].
    pub fn with_default_timeout(base_url: &str) -> Result<Self, BookServerError> {
        Self::new(base_url, REQUEST_TIMEOUT)
    }

    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl BookServer for BookServerClient {
    /// POST /start
    async fn start(&self) -> Result<(), BookServerError> {
        self.client.post(START_PATH).await?;
        tracing::info!(url = %self.base_url(), "Order book server started");
        Ok(())
    }

    /// GET /snapshot?depth=N
    async fn snapshot(&self, depth: usize) -> Result<BookSnapshot, BookServerError> {
        let query = format!("depth={}", depth);
        let response: SnapshotResponse =
            self.client.get_json(SNAPSHOT_PATH, Some(&query)).await?;

        tracing::debug!(
            last_update_id = response.last_update_id,
            bids = response.bids.len(),
            asks = response.asks.len(),
            "Snapshot received"
        );

        Ok(response.into_snapshot()?)
    }

    /// POST /assertion
    async fn submit_assertion(&self, view: &BookView) -> Verdict {
        match self.client.post_json(ASSERTION_PATH, view).await {
            Ok(()) => Verdict::Passed,
            Err(RestError::HttpError { status, message }) => Verdict::Rejected {
                status,
                body: message,
            },
            Err(e) => Verdict::Undelivered(e.to_string()),
        }
    }
}
