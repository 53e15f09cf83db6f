//! Shared data types for the order book mirror.
//!
//! Prices and quantities are unsigned integers scaled by 10^7 (see [`fixed`]).

pub mod fixed;

use serde::{Deserialize, Serialize};

pub use fixed::{format_scaled, parse_scaled, FixedPointError, SCALE, SCALE_DIGITS};

/// Side of the book a level or update belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Bid,
    Ask,
}

impl TryFrom<u16> for Side {
    type Error = u16;

    /// Decode the wire side indicator: `1` is bid, `0` is ask.
    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        match raw {
            1 => Ok(Side::Bid),
            0 => Ok(Side::Ask),
            other => Err(other),
        }
    }
}

impl From<Side> for u16 {
    fn from(side: Side) -> Self {
        match side {
            Side::Bid => 1,
            Side::Ask => 0,
        }
    }
}

/// A single price level, both fields scaled by [`SCALE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PriceLevel {
    pub price: u64,
    pub quantity: u64,
}

impl PriceLevel {
    pub fn new(price: u64, quantity: u64) -> Self {
        Self { price, quantity }
    }

    /// A zero quantity means the level is absent from the book.
    pub fn is_empty(&self) -> bool {
        self.quantity == 0
    }
}

/// One incremental update to a single price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaMessage {
    pub side: Side,
    pub sequence: u64,
    pub price: u64,
    pub quantity: u64,
}

/// Decoded order book snapshot at `last_update_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookSnapshot {
    pub last_update_id: u64,
    pub bids: Vec<PriceLevel>,
    pub asks: Vec<PriceLevel>,
}

/// Depth-limited view of the book as submitted for assertion.
///
/// Levels are `[price, quantity]` pairs of fixed 7-digit decimal strings,
/// best level first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookView {
    #[serde(rename = "lastUpdateId")]
    pub last_update_id: u64,
    pub bids: Vec<(String, String)>,
    pub asks: Vec<(String, String)>,
}
