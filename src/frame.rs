//! On-air packet framing.
//!
//! Every frame starts with a 4-byte header:
//!
//! ```text
//! ┌───────────┬─────────────┬───────────┬──────────────┬─────────────┐
//! │ to (1B)   │ from (1B)   │ id (1B)   │ flags (1B)   │ payload ... │
//! └───────────┴─────────────┴───────────┴──────────────┴─────────────┘
//! ```
//!
//! `id` is a per-message sequence number echoed back in acknowledgements,
//! which is how a sender matches an ACK to its outstanding message. Flag
//! bit 0 marks a frame as an ACK; the remaining bits are reserved.

use std::fmt;

/// Destination address that every node accepts.
pub const BROADCAST_ADDRESS: u8 = 255;

/// Header flag bit 0: this frame acknowledges `id`.
pub const FLAG_ACK: u8 = 0x01;

/// Header size in bytes.
pub const HEADER_LEN: usize = 4;

/// Radio FIFO capacity; a whole frame must fit.
pub const MAX_FRAME_LEN: usize = 255;

/// Largest payload that fits after the header.
pub const MAX_PAYLOAD_LEN: usize = MAX_FRAME_LEN - HEADER_LEN;

/// ACK frame payload.
pub const ACK_PAYLOAD: &[u8] = b"!";

/// Frequency boundary separating the two RSSI calibration offsets.
pub const HIGH_BAND_THRESHOLD_MHZ: f64 = 779.0;

/// RSSI offset for carriers at or above 779 MHz.
const HIGH_BAND_RSSI_OFFSET: f64 = -157.0;
/// RSSI offset for carriers below 779 MHz.
const LOW_BAND_RSSI_OFFSET: f64 = -164.0;

/// The 4-byte addressing header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Destination address (255 = broadcast).
    pub to: u8,
    /// Sender address.
    pub from: u8,
    /// Sequence id, echoed in ACKs.
    pub id: u8,
    /// Flag bits; bit 0 = ACK.
    pub flags: u8,
}

impl FrameHeader {
    /// Whether the ACK flag is set.
    pub fn is_ack(&self) -> bool {
        self.flags & FLAG_ACK != 0
    }
}

/// A link-layer frame: header plus (possibly encrypted) payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
}

impl Frame {
    /// Serialize for the radio FIFO.
    pub fn encode(&self) -> Vec<u8> {
        let mut raw = Vec::with_capacity(HEADER_LEN + self.payload.len());
        raw.push(self.header.to);
        raw.push(self.header.from);
        raw.push(self.header.id);
        raw.push(self.header.flags);
        raw.extend_from_slice(&self.payload);
        raw
    }

    /// Parse a frame read out of the radio FIFO.
    ///
    /// Anything shorter than the 4-byte header is rejected; the caller is
    /// expected to drop it.
    pub fn parse(raw: &[u8]) -> Result<Frame, FrameError> {
        if raw.len() < HEADER_LEN {
            return Err(FrameError::Runt { len: raw.len() });
        }
        Ok(Frame {
            header: FrameHeader {
                to: raw[0],
                from: raw[1],
                id: raw[2],
                flags: raw[3],
            },
            payload: raw[HEADER_LEN..].to_vec(),
        })
    }
}

/// Frame parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Fewer bytes than the minimum header size.
    Runt { len: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runt { len } => {
                write!(f, "frame too short: {} bytes (minimum {})", len, HEADER_LEN)
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// A received and parsed packet, as handed to the application callback.
#[derive(Debug, Clone)]
pub struct ReceivedPacket {
    /// Payload after any decryption.
    pub message: Vec<u8>,
    /// Addressing header as received.
    pub header: FrameHeader,
    /// Received signal strength in dBm.
    pub rssi: f64,
    /// Signal-to-noise ratio in dB.
    pub snr: f64,
}

impl ReceivedPacket {
    /// Whether this packet is an acknowledgement.
    pub fn is_ack(&self) -> bool {
        self.header.is_ack()
    }
}

/// Derive (SNR, RSSI) from the packet status registers.
///
/// SNR comes from `REG_PKT_SNR_VALUE` as a signed value in fourths of a dB.
/// The raw RSSI reading is folded with the SNR when the packet arrived below
/// the noise floor, stretched by 16/15 otherwise, then shifted by the
/// band-dependent calibration offset.
pub fn signal_quality(snr_raw: u8, rssi_raw: u8, high_band: bool) -> (f64, f64) {
    let snr = (snr_raw as i8) as f64 / 4.0;
    let mut rssi = rssi_raw as f64;
    if snr < 0.0 {
        rssi += snr;
    } else {
        rssi = rssi * 16.0 / 15.0;
    }
    rssi += if high_band {
        HIGH_BAND_RSSI_OFFSET
    } else {
        LOW_BAND_RSSI_OFFSET
    };
    (snr, rssi)
}
