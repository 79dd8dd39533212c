//! Half-duplex LoRa packet link for SX127x (RFM95/96/97/98) radios.
//!
//! The crate drives the radio at register level through a hardware
//! capability supplied by the caller ([`RadioRegisterIo`]) and layers a
//! small link protocol on top:
//!
//! - 4-byte addressing header (`to`, `from`, `id`, `flags`) on every frame
//! - interrupt-driven mode state machine (sleep / idle / TX / RX / CAD)
//! - acknowledgements with randomized-backoff retries ([`RadioLink::send_to_wait`])
//! - optional channel activity detection before each transmission
//! - optional payload encryption through a pluggable block [`CryptoCodec`]
//!
//! [`RadioLink`] is the entry point; [`LinkConfig`] carries addressing, RF
//! parameters and protocol timeouts.

pub mod config;
pub mod crypto;
pub mod frame;
pub mod io;
pub mod link;
pub mod registers;

pub use config::{ConfigError, LinkConfig, ModemConfig};
pub use crypto::{CryptoCodec, CIPHER_BLOCK_LEN};
pub use frame::{
    Frame, FrameError, FrameHeader, ReceivedPacket, ACK_PAYLOAD, BROADCAST_ADDRESS, FLAG_ACK,
    MAX_PAYLOAD_LEN,
};
pub use io::{InterruptCallback, RadioRegisterIo};
pub use link::{LinkError, Mode, RadioLink, ReceiveCallback};
