//! SX127x (RFM95/96/97/98) LoRa-mode register map.
//!
//! Only the registers and bit values the link layer actually touches are
//! listed here. Register addresses are the raw 7-bit addresses; the
//! [`RadioRegisterIo`](crate::io::RadioRegisterIo) implementation is
//! responsible for the read/write bit on the wire.

/// FIFO read/write port.
pub const REG_FIFO: u8 = 0x00;
/// Operating mode (LoRa bit + device mode).
pub const REG_OP_MODE: u8 = 0x01;
/// Carrier frequency, most significant byte.
pub const REG_FRF_MSB: u8 = 0x06;
/// Carrier frequency, middle byte.
pub const REG_FRF_MID: u8 = 0x07;
/// Carrier frequency, least significant byte.
pub const REG_FRF_LSB: u8 = 0x08;
/// Power amplifier configuration.
pub const REG_PA_CONFIG: u8 = 0x09;
/// FIFO read/write pointer.
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;
/// FIFO transmit base address.
pub const REG_FIFO_TX_BASE_ADDR: u8 = 0x0E;
/// FIFO receive base address.
pub const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;
/// Start of the most recently received packet in the FIFO.
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;
/// Interrupt flags.
pub const REG_IRQ_FLAGS: u8 = 0x12;
/// Number of payload bytes of the latest received packet.
pub const REG_RX_NB_BYTES: u8 = 0x13;
/// SNR of the latest received packet (signed, fourths of a dB).
pub const REG_PKT_SNR_VALUE: u8 = 0x19;
/// RSSI of the latest received packet (raw, needs band offset).
pub const REG_PKT_RSSI_VALUE: u8 = 0x1A;
/// Modem configuration 1 (bandwidth, coding rate, header mode).
pub const REG_MODEM_CONFIG1: u8 = 0x1D;
/// Modem configuration 2 (spreading factor, CRC).
pub const REG_MODEM_CONFIG2: u8 = 0x1E;
/// Preamble length, most significant byte.
pub const REG_PREAMBLE_MSB: u8 = 0x20;
/// Preamble length, least significant byte.
pub const REG_PREAMBLE_LSB: u8 = 0x21;
/// TX payload length.
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;
/// Modem configuration 3 (low data rate optimize, AGC).
pub const REG_MODEM_CONFIG3: u8 = 0x26;
/// DIO0..DIO3 pin mapping.
pub const REG_DIO_MAPPING1: u8 = 0x40;
/// High-power PA_DAC control.
pub const REG_PA_DAC: u8 = 0x4D;

// Operating mode values. The long-range bit selects LoRa (vs FSK/OOK) and
// must stay set in every mode write.

/// LoRa long-range mode bit for `REG_OP_MODE`.
pub const LONG_RANGE_MODE: u8 = 0x80;
pub const MODE_SLEEP: u8 = 0x00;
pub const MODE_STDBY: u8 = 0x01;
pub const MODE_TX: u8 = 0x03;
pub const MODE_RX_CONTINUOUS: u8 = 0x05;
pub const MODE_CAD: u8 = 0x07;

// IRQ flag bits (`REG_IRQ_FLAGS`).

pub const IRQ_CAD_DETECTED: u8 = 0x01;
pub const IRQ_CAD_DONE: u8 = 0x04;
pub const IRQ_TX_DONE: u8 = 0x08;
pub const IRQ_RX_DONE: u8 = 0x40;

// DIO0 mappings (`REG_DIO_MAPPING1` upper bits). The interrupt line fires
// on the event matching the mode the driver is entering.

/// DIO0 rises on RxDone.
pub const DIO0_RX_DONE: u8 = 0x00;
/// DIO0 rises on TxDone.
pub const DIO0_TX_DONE: u8 = 0x40;
/// DIO0 rises on CadDone.
pub const DIO0_CAD_DONE: u8 = 0x80;

// Power amplifier control.

/// PA_BOOST output selection (required on RFM9x modules).
pub const PA_SELECT: u8 = 0x80;
/// PA_DAC value enabling the +3 dBm high-power mode.
pub const PA_DAC_ENABLE: u8 = 0x07;
/// PA_DAC default value.
pub const PA_DAC_DISABLE: u8 = 0x04;

/// Crystal oscillator frequency in Hz.
pub const FXOSC: f64 = 32_000_000.0;
/// Frequency synthesizer step: FXOSC / 2^19.
pub const FSTEP: f64 = FXOSC / 524_288.0;
