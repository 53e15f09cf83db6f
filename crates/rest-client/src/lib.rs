//! Small JSON-over-HTTP client on top of `reqwest`.
//!
//! ```rust,ignore
//! use rest_client::RestClient;
//!
//! let client = RestClient::new("http://localhost:9090", Duration::from_secs(30))?;
//! client.post("/start").await?;
//! let snapshot: serde_json::Value = client.get_json("/snapshot", Some("depth=100")).await?;
//! ```

mod client;
mod error;

pub use client::RestClient;
pub use error::RestError;
