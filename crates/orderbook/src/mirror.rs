//! Local mirror of the remote order book.

use model::{format_scaled, BookView, DeltaMessage, PriceLevel, Side};
use tracing::debug;

use crate::ledger::{AskLedger, BidLedger};

/// Bid and ask ledgers plus the sequence number of the last applied update.
///
/// The mirror trusts its caller for ordering: `apply_delta` records whatever
/// sequence it is given. Stale or out-of-order updates must be filtered
/// before they reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderBookMirror {
    bids: BidLedger,
    asks: AskLedger,
    last_sequence: u64,
}

impl OrderBookMirror {
    /// Returns an empty mirror at sequence 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole book with a snapshot taken at `sequence`.
    ///
    /// Zero-quantity levels in the snapshot are skipped.
    pub fn load_snapshot(&mut self, sequence: u64, bids: &[PriceLevel], asks: &[PriceLevel]) {
        self.bids.clear();
        self.asks.clear();

        for level in bids.iter().filter(|level| !level.is_empty()) {
            self.bids.upsert(level.price, level.quantity);
        }
        for level in asks.iter().filter(|level| !level.is_empty()) {
            self.asks.upsert(level.price, level.quantity);
        }

        self.last_sequence = sequence;

        debug!(
            sequence,
            bid_levels = self.bids.size(),
            ask_levels = self.asks.size(),
            "Snapshot loaded into mirror"
        );
    }

    /// Apply one price-level update and record its sequence.
    pub fn apply_delta(&mut self, message: &DeltaMessage) {
        match message.side {
            Side::Bid => self.bids.upsert(message.price, message.quantity),
            Side::Ask => self.asks.upsert(message.price, message.quantity),
        }
        self.last_sequence = message.sequence;
    }

    /// Render the top `depth` levels per side for assertion.
    pub fn serialize(&self, depth: usize) -> BookView {
        let render = |level: PriceLevel| (format_scaled(level.price), format_scaled(level.quantity));

        BookView {
            last_update_id: self.last_sequence,
            bids: self.bids.top_n(depth).map(render).collect(),
            asks: self.asks.top_n(depth).map(render).collect(),
        }
    }

    /// Returns the sequence of the last snapshot or delta applied.
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Returns the bid ledger.
    pub fn bids(&self) -> &BidLedger {
        &self.bids
    }

    /// Returns the ask ledger.
    pub fn asks(&self) -> &AskLedger {
        &self.asks
    }

    /// Returns the number of bid levels.
    pub fn bid_levels(&self) -> usize {
        self.bids.size()
    }

    /// Returns the number of ask levels.
    pub fn ask_levels(&self) -> usize {
        self.asks.size()
    }
}
