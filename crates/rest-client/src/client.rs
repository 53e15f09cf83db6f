use crate::error::RestError;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// HTTP client bound to one base URL.
///
/// Every call treats any 2xx as success. Other statuses come back as
/// [`RestError::HttpError`] carrying the response text.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
    base_url: String,
}

impl RestClient {
    /// # Errors
    /// Returns [`RestError::RequestBuild`] if the underlying client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RestError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RestError::RequestBuild(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `path` and decode the JSON body. `query` is appended after a `?`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Option<&str>,
    ) -> Result<T, RestError> {
        let url = self.url(path, query);
        tracing::debug!(url = %url, "GET");

        let response = Self::send(self.http.get(&url)).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::warn!(url = %url, error = %e, body = %body, "Undecodable response body");
            RestError::Parse(e.to_string())
        })
    }

    /// POST with no body, discarding the response.
    pub async fn post(&self, path: &str) -> Result<(), RestError> {
        let url = self.url(path, None);
        tracing::debug!(url = %url, "POST");

        Self::send(self.http.post(&url)).await.map(drop)
    }

    /// POST `body` as JSON, discarding the response.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), RestError> {
        let url = self.url(path, None);
        tracing::debug!(url = %url, "POST json");

        Self::send(self.http.post(&url).json(body)).await.map(drop)
    }

    fn url(&self, path: &str, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}{}?{}", self.base_url, path, q),
            None => format!("{}{}", self.base_url, path),
        }
    }

    async fn send(request: RequestBuilder) -> Result<Response, RestError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(RestError::HttpError {
            status: status.as_u16(),
            message: response.text().await.unwrap_or_default(),
        })
    }
}
