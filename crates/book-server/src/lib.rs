//! Client for the order book server's HTTP surface.
//!
//! - `POST /start` kicks off order book generation
//! - `GET /snapshot?depth=N` returns the book at a known `lastUpdateId`
//! - `POST /assertion` checks a mirrored book against the server's own
//!
//! The [`BookServer`] trait is the seam the sync controller drives, so the
//! protocol can be exercised against an in-memory server in tests.

mod client;
mod error;
mod responses;

use async_trait::async_trait;
use model::{BookSnapshot, BookView};

pub use client::BookServerClient;
pub use error::BookServerError;
pub use responses::SnapshotResponse;

/// Outcome of submitting a mirrored book for assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The server accepted the book (2xx).
    Passed,
    /// The server rejected the book; `body` carries its diagnostics.
    Rejected { status: u16, body: String },
    /// The assertion request never got an answer.
    Undelivered(String),
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

/// Operations the sync controller needs from the order book server.
#[async_trait]
pub trait BookServer: Send + Sync {
    /// Ask the server to start generating order book updates.
    async fn start(&self) -> Result<(), BookServerError>;

    /// Fetch a snapshot holding at most `depth` levels per side.
    async fn snapshot(&self, depth: usize) -> Result<BookSnapshot, BookServerError>;

    /// Submit a mirrored book. Never fails: every outcome is a [`Verdict`].
    async fn submit_assertion(&self, view: &BookView) -> Verdict;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_passed_is_pass() {
        assert!(Verdict::Passed.is_pass());
        assert!(!Verdict::Rejected {
            status: 400,
            body: "mismatch".to_string()
        }
        .is_pass());
        assert!(!Verdict::Undelivered("refused".to_string()).is_pass());
    }
}
