//! Shared plumbing for the order book mirror: reconnect backoff, endpoint
//! configuration and process-wide logging setup.

mod backoff;
mod endpoints;
mod logging;

pub use backoff::Backoff;
pub use endpoints::{Endpoints, DEFAULT_FEED_URL, DEFAULT_SERVER_URL};
pub use logging::init_logging;
