//! Order book server error types.

use model::FixedPointError;
use rest_client::RestError;
use thiserror::Error;

/// Errors talking to the order book server.
#[derive(Debug, Error)]
pub enum BookServerError {
    /// Transport failure or non-success status.
    #[error("REST client error: {0}")]
    Rest(#[from] RestError),

    /// Snapshot contained a price or quantity that is not a valid decimal.
    #[error("invalid snapshot level: {0}")]
    InvalidSnapshot(#[from] FixedPointError),
}
