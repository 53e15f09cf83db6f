//! Snapshot + delta stream synchronization for the order book mirror.
//!
//! 1. `POST /start` on the order book server
//! 2. `GET /snapshot?depth=N` and load it into an [`orderbook::OrderBookMirror`]
//! 3. Open the binary delta feed and apply 26-byte frames in arrival order
//! 4. Once the mirror reaches the target sequence, `POST /assertion` with
//!    its depth-limited view and stop
//!
//! Stream failures reconnect with backoff; malformed frames are skipped.

mod controller;
mod error;
mod feed;
mod frame;

pub use controller::{
    ReconnectPolicy, SyncConfig, SyncController, SyncOutcome, SyncState, DEFAULT_DEPTH,
    DEFAULT_PROGRESS_INTERVAL,
};
pub use error::{ConnectorError, SyncError};
pub use feed::{DeltaFeed, WebSocketFeed};
pub use frame::{decode_frame, encode_frame, FrameError, FRAME_LEN};
