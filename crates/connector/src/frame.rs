//! Binary delta frame codec.
//!
//! Layout, all big-endian:
//!
//! | bytes  | field                      |
//! |--------|----------------------------|
//! | 0..2   | side, `1` = bid, `0` = ask |
//! | 2..10  | sequence                   |
//! | 10..18 | price (scaled by 10^7)     |
//! | 18..26 | quantity (scaled by 10^7)  |

use model::{DeltaMessage, Side};
use thiserror::Error;

/// Exact size of a delta frame.
pub const FRAME_LEN: usize = 26;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("invalid frame length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown side indicator: {0}")]
    UnknownSide(u16),
}

/// Decode one delta frame.
pub fn decode_frame(bytes: &[u8]) -> Result<DeltaMessage, FrameError> {
    let frame: &[u8; FRAME_LEN] = bytes.try_into().map_err(|_| FrameError::InvalidLength {
        expected: FRAME_LEN,
        actual: bytes.len(),
    })?;

    let side = u16::from_be_bytes([frame[0], frame[1]]);
    let side = Side::try_from(side).map_err(FrameError::UnknownSide)?;

    Ok(DeltaMessage {
        side,
        sequence: read_u64(frame, 2),
        price: read_u64(frame, 10),
        quantity: read_u64(frame, 18),
    })
}

/// Encode a delta into its wire frame.
pub fn encode_frame(message: &DeltaMessage) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[0..2].copy_from_slice(&u16::from(message.side).to_be_bytes());
    frame[2..10].copy_from_slice(&message.sequence.to_be_bytes());
    frame[10..18].copy_from_slice(&message.price.to_be_bytes());
    frame[18..26].copy_from_slice(&message.quantity.to_be_bytes());
    frame
}

fn read_u64(frame: &[u8; FRAME_LEN], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&frame[at..at + 8]);
    u64::from_be_bytes(word)
}
