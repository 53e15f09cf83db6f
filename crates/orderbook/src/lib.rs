//! Local order book mirror built from a snapshot plus streamed deltas.
//!
//! Each side is a [`PriceLevelLedger`] over a `BTreeMap` whose key type
//! fixes the iteration order:
//! - bids use `Reverse<u64>` keys (highest price first)
//! - asks use `u64` keys (lowest price first)
//!
//! # Example
//!
//! ```rust
//! use model::{DeltaMessage, PriceLevel, Side, SCALE};
//! use orderbook::OrderBookMirror;
//!
//! let mut mirror = OrderBookMirror::new();
//! mirror.load_snapshot(0, &[PriceLevel::new(10 * SCALE, SCALE)], &[]);
//!
//! mirror.apply_delta(&DeltaMessage {
//!     side: Side::Bid,
//!     sequence: 1,
//!     price: 10 * SCALE,
//!     quantity: 0,
//! });
//!
//! let view = mirror.serialize(100);
//! assert_eq!(view.last_update_id, 1);
//! assert!(view.bids.is_empty());
//! ```

mod ledger;
mod mirror;

pub use ledger::{AskLedger, BidLedger, LevelKey, PriceLevelLedger};
pub use mirror::OrderBookMirror;
