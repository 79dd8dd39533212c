//! Interrupt-driven half-duplex link layer.
//!
//! [`RadioLink`] owns the radio's mode state machine and the
//! acknowledgement/retry protocol on top of the 4-byte frame header. The
//! radio is strictly half-duplex: at any instant it is sleeping, idling,
//! transmitting, receiving, or sensing the channel (CAD). All transitions
//! are requested by the driver itself; the application only ever calls the
//! send entry points and [`RadioLink::set_mode_rx`] to start listening.
//!
//! # Interrupt handling
//!
//! The hardware capability invokes the registered callback on its own
//! thread whenever DIO0 rises. The handler branches on the *driver's*
//! current mode, not just the IRQ flags, so a stale TxDone flag arriving
//! after the driver has already moved on is ignored instead of being
//! misread as a fresh event.
//!
//! # Concurrency
//!
//! One application thread plus the interrupt thread share the link state
//! through a mutex and a condition variable. Every blocking wait
//! (`wait_packet_sent`, the ACK wait, the CAD wait) is a bounded
//! `Condvar::wait_timeout` signaled by the interrupt handler.
//!
//! # Usage
//!
//! ```ignore
//! use lora_link::{LinkConfig, RadioLink};
//!
//! let mut config = LinkConfig::new(2, 17);
//! config.acks_enabled = true;
//!
//! let link = RadioLink::new(bus, config)?;
//! link.on_receive(|packet| println!("from {}: {:?}", packet.header.from, packet.message));
//! link.set_mode_rx()?;
//!
//! if link.send_to_wait(b"hello", 3, 0, 3)? {
//!     println!("delivered");
//! }
//! ```

use crate::config::{ConfigError, LinkConfig};
use crate::crypto::{decrypt_payload, encrypt_payload, CryptoCodec, CIPHER_BLOCK_LEN};
use crate::frame::{
    signal_quality, Frame, FrameHeader, ReceivedPacket, ACK_PAYLOAD, BROADCAST_ADDRESS, FLAG_ACK,
    HEADER_LEN, HIGH_BAND_THRESHOLD_MHZ, MAX_FRAME_LEN,
};
use crate::io::RadioRegisterIo;
use crate::registers::*;
use log::{debug, info, warn};
use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

/// Settling pause after a mode write the modem needs to absorb (sleep at
/// init, standby before CAD entry).
const MODE_SETTLE_DELAY: Duration = Duration::from_millis(10);

/// Pause between CAD cycles while the channel stays busy.
const CAD_RETRY_INTERVAL: Duration = Duration::from_millis(100);

/// Radio operating mode as tracked by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Sleep,
    Idle,
    Tx,
    RxContinuous,
    Cad,
}

impl Mode {
    /// Device mode bits for `REG_OP_MODE` (without the long-range bit).
    fn op_mode(self) -> u8 {
        match self {
            Self::Sleep => MODE_SLEEP,
            Self::Idle => MODE_STDBY,
            Self::Tx => MODE_TX,
            Self::RxContinuous => MODE_RX_CONTINUOUS,
            Self::Cad => MODE_CAD,
        }
    }

    /// DIO0 mapping to program on entry, if the mode has a completion
    /// interrupt.
    fn dio0_mapping(self) -> Option<u8> {
        match self {
            Self::Tx => Some(DIO0_TX_DONE),
            Self::RxContinuous => Some(DIO0_RX_DONE),
            Self::Cad => Some(DIO0_CAD_DONE),
            Self::Sleep | Self::Idle => None,
        }
    }
}

/// Link errors.
#[derive(Debug)]
pub enum LinkError<E> {
    /// Register bus failure.
    Bus(E),
    /// The op-mode register did not read back as LoRa sleep at init.
    HardwareInit { op_mode: u8 },
    /// Rejected configuration.
    Config(ConfigError),
    /// Frame would not fit the radio FIFO (size after any encryption
    /// expansion).
    PayloadTooLarge { size: usize, max: usize },
}

impl<E: fmt::Debug> fmt::Display for LinkError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "register bus error: {:?}", e),
            Self::HardwareInit { op_mode } => write!(
                f,
                "radio did not enter LoRa sleep mode (op mode {:#04x})",
                op_mode
            ),
            Self::Config(e) => write!(f, "{}", e),
            Self::PayloadTooLarge { size, max } => {
                write!(f, "frame too large: {} bytes (max {})", size, max)
            }
        }
    }
}

impl<E: fmt::Debug> std::error::Error for LinkError<E> {}

/// Application receive callback.
pub type ReceiveCallback = Box<dyn FnMut(&ReceivedPacket) + Send + 'static>;

/// State shared between the application thread and the interrupt thread.
struct Shared {
    mode: Mode,
    /// Outcome of the latest CAD cycle; `None` until CadDone fires.
    cad_detected: Option<bool>,
    /// Sequence id of the last application-level message, wraps mod 256.
    last_header_id: u8,
    /// Most recent successfully parsed packet.
    last_received: Option<ReceivedPacket>,
}

struct LinkInner<B: RadioRegisterIo> {
    bus: Mutex<B>,
    shared: Mutex<Shared>,
    cond: Condvar,
    config: LinkConfig,
    /// Carrier at or above 779 MHz; selects the RSSI calibration offset.
    high_band: bool,
    codec: Option<Box<dyn CryptoCodec>>,
    on_receive: Mutex<Option<ReceiveCallback>>,
}

/// Half-duplex LoRa packet link over a [`RadioRegisterIo`] capability.
///
/// Construction brings the hardware up (LoRa sleep, modem configuration,
/// carrier frequency, TX power) and registers the interrupt handler.
/// The link lives until [`close`](RadioLink::close), which puts the radio
/// to sleep.
pub struct RadioLink<B: RadioRegisterIo> {
    inner: Arc<LinkInner<B>>,
}

impl<B: RadioRegisterIo> RadioLink<B> {
    /// Create a link with no payload encryption.
    pub fn new(bus: B, config: LinkConfig) -> Result<Self, LinkError<B::Error>> {
        Self::build(bus, config, None)
    }

    /// Create a link that encrypts and decrypts payloads with the given
    /// codec. Every outgoing payload goes through the codec, including
    /// internally generated ACKs.
    pub fn with_codec(
        bus: B,
        config: LinkConfig,
        codec: Box<dyn CryptoCodec>,
    ) -> Result<Self, LinkError<B::Error>> {
        Self::build(bus, config, Some(codec))
    }

    fn build(
        mut bus: B,
        config: LinkConfig,
        codec: Option<Box<dyn CryptoCodec>>,
    ) -> Result<Self, LinkError<B::Error>> {
        config.validate().map_err(LinkError::Config)?;
        initialize(&mut bus, &config)?;

        let interrupt_pin = config.interrupt_pin;
        let high_band = config.frequency_mhz >= HIGH_BAND_THRESHOLD_MHZ;
        let inner = Arc::new(LinkInner {
            bus: Mutex::new(bus),
            shared: Mutex::new(Shared {
                mode: Mode::Idle,
                cad_detected: None,
                last_header_id: 0,
                last_received: None,
            }),
            cond: Condvar::new(),
            config,
            high_band,
            codec,
            on_receive: Mutex::new(None),
        });

        // A weak reference keeps the capability's callback from pinning the
        // link alive after close/drop.
        let weak = Arc::downgrade(&inner);
        {
            let mut bus = inner.lock_bus();
            bus.on_rising_edge(
                interrupt_pin,
                Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.handle_interrupt();
                    }
                }),
            )
            .map_err(LinkError::Bus)?;
        }

        Ok(Self { inner })
    }

    /// Register the application's packet handler. Packets carrying the ACK
    /// flag are consumed by the retry protocol and never reach it.
    pub fn on_receive<F>(&self, callback: F)
    where
        F: FnMut(&ReceivedPacket) + Send + 'static,
    {
        let mut slot = self
            .inner
            .on_receive
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Some(Box::new(callback));
    }

    /// Frame and transmit a payload. Fire and forget: returns as soon as
    /// the bytes are in the FIFO and the radio has entered TX; completion
    /// is observed via the TxDone interrupt.
    pub fn send(
        &self,
        payload: &[u8],
        destination: u8,
        header_id: u8,
        header_flags: u8,
    ) -> Result<(), LinkError<B::Error>> {
        self.inner
            .send_frame(payload, destination, header_id, header_flags)
    }

    /// Reliable-delivery send: retries until a matching ACK arrives or
    /// `retries + 1` attempts are exhausted. Returns `Ok(false)` on
    /// exhaustion. Broadcasts succeed after a single transmission, no ACK
    /// expected.
    pub fn send_to_wait(
        &self,
        payload: &[u8],
        destination: u8,
        header_flags: u8,
        retries: u8,
    ) -> Result<bool, LinkError<B::Error>> {
        self.inner
            .send_to_wait(payload, destination, header_flags, retries)
    }

    /// Enter continuous receive mode.
    pub fn set_mode_rx(&self) -> Result<(), LinkError<B::Error>> {
        self.inner.set_mode(Mode::RxContinuous)
    }

    /// Enter standby.
    pub fn set_mode_idle(&self) -> Result<(), LinkError<B::Error>> {
        self.inner.set_mode(Mode::Idle)
    }

    /// Put the radio to sleep.
    pub fn sleep(&self) -> Result<(), LinkError<B::Error>> {
        self.inner.set_mode(Mode::Sleep)
    }

    /// Current driver mode.
    pub fn mode(&self) -> Mode {
        self.inner.lock_shared().mode
    }

    /// Most recent successfully parsed packet, if any.
    pub fn last_received(&self) -> Option<ReceivedPacket> {
        self.inner.lock_shared().last_received.clone()
    }

    /// Sequence id assigned to the last `send_to_wait` message.
    pub fn last_header_id(&self) -> u8 {
        self.inner.lock_shared().last_header_id
    }

    /// Sleep the radio and release the link. The register capability is
    /// dropped with the link; the interrupt callback deactivates itself.
    pub fn close(self) -> Result<(), LinkError<B::Error>> {
        self.inner.set_mode(Mode::Sleep)
    }
}

impl<B: RadioRegisterIo> LinkInner<B> {
    fn lock_bus(&self) -> MutexGuard<'_, B> {
        // Recover from a poisoned mutex by taking the inner value; the
        // interrupt path must never panic.
        self.bus.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Entry point for the hardware interrupt callback.
    fn handle_interrupt(&self) {
        if let Err(e) = self.service_interrupt() {
            warn!("interrupt service failed: {}", e);
        }
    }

    /// Branch on the current mode and the IRQ flags. The mode check fences
    /// out stale flags left over from a previous mode.
    fn service_interrupt(&self) -> Result<(), LinkError<B::Error>> {
        let irq = self
            .lock_bus()
            .read_register(REG_IRQ_FLAGS)
            .map_err(LinkError::Bus)?;
        let mode = self.lock_shared().mode;

        match mode {
            Mode::RxContinuous if irq & IRQ_RX_DONE != 0 => self.on_rx_done()?,
            Mode::Tx if irq & IRQ_TX_DONE != 0 => {
                debug!("transmission complete");
                self.complete_to_idle(Mode::Tx)?;
            }
            Mode::Cad if irq & IRQ_CAD_DONE != 0 => {
                let detected = irq & IRQ_CAD_DETECTED != 0;
                debug!("CAD complete, channel {}", if detected { "busy" } else { "clear" });
                self.finish_cad(detected)?;
            }
            _ => debug!("ignoring stale interrupt: irq {:#04x} in mode {:?}", irq, mode),
        }

        self.lock_bus()
            .write_register(REG_IRQ_FLAGS, 0xFF)
            .map_err(LinkError::Bus)?;
        Ok(())
    }

    /// Drain the just-received packet from the FIFO and run the receive
    /// protocol: address filter, decrypt, auto-ack, store, deliver.
    fn on_rx_done(&self) -> Result<(), LinkError<B::Error>> {
        let (raw, snr, rssi) = {
            let mut bus = self.lock_bus();
            let len = bus
                .read_register(REG_RX_NB_BYTES)
                .map_err(LinkError::Bus)? as usize;
            let packet_start = bus
                .read_register(REG_FIFO_RX_CURRENT_ADDR)
                .map_err(LinkError::Bus)?;
            bus.write_register(REG_FIFO_ADDR_PTR, packet_start)
                .map_err(LinkError::Bus)?;
            let raw = bus.burst_read(REG_FIFO, len).map_err(LinkError::Bus)?;
            bus.write_register(REG_IRQ_FLAGS, 0xFF)
                .map_err(LinkError::Bus)?;

            let snr_raw = bus
                .read_register(REG_PKT_SNR_VALUE)
                .map_err(LinkError::Bus)?;
            let rssi_raw = bus
                .read_register(REG_PKT_RSSI_VALUE)
                .map_err(LinkError::Bus)?;
            let (snr, rssi) = signal_quality(snr_raw, rssi_raw, self.high_band);
            (raw, snr, rssi)
        };

        let frame = match Frame::parse(&raw) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("dropping malformed packet: {}", e);
                return Ok(());
            }
        };
        let header = frame.header;

        if header.to != self.config.this_address
            && header.to != BROADCAST_ADDRESS
            && !self.config.receive_all
        {
            debug!("dropping packet addressed to {}", header.to);
            return Ok(());
        }

        let mut message = frame.payload;
        if let Some(codec) = &self.codec {
            if !message.is_empty() && message.len() % CIPHER_BLOCK_LEN == 0 {
                message = decrypt_payload(codec.as_ref(), &message);
            }
        }

        let is_ack = header.is_ack();
        if self.config.acks_enabled && header.to == self.config.this_address && !is_ack {
            if let Err(e) = self.send_ack(header.from, header.id) {
                warn!("failed to acknowledge packet {}: {}", header.id, e);
            }
            self.set_mode(Mode::RxContinuous)?;
        }

        debug!(
            "received {} bytes from {} (id {}, rssi {:.1} dBm, snr {:.1} dB)",
            message.len(),
            header.from,
            header.id,
            rssi,
            snr
        );

        let packet = ReceivedPacket {
            message,
            header,
            rssi,
            snr,
        };
        {
            let mut shared = self.lock_shared();
            shared.last_received = Some(packet.clone());
            self.cond.notify_all();
        }

        // ACKs are consumed by the retry protocol, never delivered.
        if !is_ack {
            let mut slot = self.on_receive.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(callback) = slot.as_mut() {
                callback(&packet);
            }
        }
        Ok(())
    }

    /// Frame, load and transmit one packet.
    fn send_frame(
        &self,
        payload: &[u8],
        destination: u8,
        header_id: u8,
        header_flags: u8,
    ) -> Result<(), LinkError<B::Error>> {
        if !self.wait_packet_sent() {
            debug!("previous transmission still in flight, proceeding");
        }
        self.set_mode(Mode::Idle)?;
        if !self.wait_cad()? {
            debug!("channel still busy after CAD timeout, transmitting anyway");
        }

        let body = match &self.codec {
            Some(codec) => encrypt_payload(codec.as_ref(), payload),
            None => payload.to_vec(),
        };
        let size = HEADER_LEN + body.len();
        if size > MAX_FRAME_LEN {
            return Err(LinkError::PayloadTooLarge {
                size,
                max: MAX_FRAME_LEN,
            });
        }

        let frame = Frame {
            header: FrameHeader {
                to: destination,
                from: self.config.this_address,
                id: header_id,
                flags: header_flags,
            },
            payload: body,
        };
        let raw = frame.encode();

        {
            let mut bus = self.lock_bus();
            bus.write_register(REG_FIFO_ADDR_PTR, 0)
                .map_err(LinkError::Bus)?;
            bus.burst_write(REG_FIFO, &raw).map_err(LinkError::Bus)?;
            bus.write_register(REG_PAYLOAD_LENGTH, raw.len() as u8)
                .map_err(LinkError::Bus)?;
        }
        debug!(
            "transmitting {} bytes to {} (id {}, flags {:#04x})",
            raw.len(),
            destination,
            header_id,
            header_flags
        );
        self.set_mode(Mode::Tx)
    }

    fn send_to_wait(
        &self,
        payload: &[u8],
        destination: u8,
        header_flags: u8,
        retries: u8,
    ) -> Result<bool, LinkError<B::Error>> {
        // One id per logical message, shared by every retry, so the
        // receiver's ACK echo matches any attempt that got through.
        let header_id = {
            let mut shared = self.lock_shared();
            shared.last_header_id = shared.last_header_id.wrapping_add(1);
            shared.last_header_id
        };

        for attempt in 0..=retries {
            if attempt > 0 {
                debug!("retrying message {} (attempt {})", header_id, attempt + 1);
            }
            self.send_frame(payload, destination, header_id, header_flags)?;
            self.set_mode(Mode::RxContinuous)?;

            if destination == BROADCAST_ADDRESS {
                return Ok(true);
            }

            // Randomized backoff decorrelates repeated collisions between
            // two nodes retrying the same airtime window.
            let timeout = self
                .config
                .retry_timeout
                .mul_f64(1.0 + rand::random::<f64>());
            if self.wait_for_ack(header_id, timeout) {
                return Ok(true);
            }
        }

        debug!("message {} unacknowledged after {} attempts", header_id, retries as u32 + 1);
        Ok(false)
    }

    /// Send the 1-byte ACK for `header_id` back to `destination` and block
    /// (bounded) until the bytes have left the radio, so re-entering RX
    /// cannot clobber the outgoing frame.
    fn send_ack(&self, destination: u8, header_id: u8) -> Result<(), LinkError<B::Error>> {
        self.send_frame(ACK_PAYLOAD, destination, header_id, FLAG_ACK)?;
        if !self.wait_packet_sent() {
            debug!("timed out waiting for ACK transmission to finish");
        }
        Ok(())
    }

    /// Block until `last_received` holds an ACK for `header_id`, bounded by
    /// `timeout`.
    fn wait_for_ack(&self, header_id: u8, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut shared = self.lock_shared();
        loop {
            if let Some(packet) = &shared.last_received {
                if packet.header.to == self.config.this_address
                    && packet.header.is_ack()
                    && packet.header.id == header_id
                {
                    return true;
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(shared, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            shared = guard;
        }
    }

    /// Block until any in-flight transmission completes, bounded by
    /// `wait_packet_sent_timeout`. Returns `false` on timeout.
    fn wait_packet_sent(&self) -> bool {
        let deadline = Instant::now() + self.config.wait_packet_sent_timeout;
        let mut shared = self.lock_shared();
        while shared.mode == Mode::Tx {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .cond
                .wait_timeout(shared, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            shared = guard;
        }
        true
    }

    /// Run CAD cycles until the channel is clear or `cad_timeout` elapses.
    /// Returns `Ok(true)` when clear; `Ok(false)` means the caller should
    /// proceed best-effort. The radio is back in standby either way, even
    /// when the deadline lands mid-cycle.
    fn wait_cad(&self) -> Result<bool, LinkError<B::Error>> {
        if self.config.cad_timeout.is_zero() {
            return Ok(true);
        }
        let deadline = Instant::now() + self.config.cad_timeout;

        loop {
            self.set_mode(Mode::Cad)?;

            // The CadDone interrupt drops us back to IDLE with the verdict;
            // None here means the deadline expired with the cycle still
            // running.
            let detected = {
                let mut shared = self.lock_shared();
                loop {
                    if shared.mode != Mode::Cad {
                        break shared.cad_detected;
                    }
                    let now = Instant::now();
                    if now >= deadline {
                        break None;
                    }
                    let (guard, _) = self
                        .cond
                        .wait_timeout(shared, deadline - now)
                        .unwrap_or_else(|e| e.into_inner());
                    shared = guard;
                }
            };

            match detected {
                Some(false) => return Ok(true),
                Some(true) if Instant::now() + CAD_RETRY_INTERVAL < deadline => {
                    thread::sleep(CAD_RETRY_INTERVAL);
                }
                _ => {
                    // Out of budget; pull the radio out of CAD before the
                    // caller loads the FIFO
                    self.set_mode(Mode::Idle)?;
                    return Ok(false);
                }
            }
        }
    }

    /// Request a mode transition. A no-op when the mode is already active,
    /// so repeated requests cause no redundant register traffic. The mode
    /// check and the register write happen under the shared-state lock, so
    /// the interrupt thread and an application thread cannot interleave
    /// between them.
    fn set_mode(&self, mode: Mode) -> Result<(), LinkError<B::Error>> {
        if mode == Mode::Cad {
            // The modem only enters CAD reliably from standby, after a
            // short settling pause.
            {
                let mut shared = self.lock_shared();
                if shared.mode == Mode::Cad {
                    return Ok(());
                }
                self.write_mode(Mode::Idle)?;
                shared.mode = Mode::Idle;
                shared.cad_detected = None;
                self.cond.notify_all();
            }
            thread::sleep(MODE_SETTLE_DELAY);
        }

        let mut shared = self.lock_shared();
        if shared.mode == mode {
            return Ok(());
        }
        self.write_mode(mode)?;
        shared.mode = mode;
        self.cond.notify_all();
        Ok(())
    }

    /// Completion transition for the interrupt handler: drop to standby
    /// only while the driver is still in `from`. A transition raced in by
    /// another thread wins and the stale completion touches no registers.
    fn complete_to_idle(&self, from: Mode) -> Result<(), LinkError<B::Error>> {
        let mut shared = self.lock_shared();
        if shared.mode != from {
            debug!("discarding {:?} completion, mode moved to {:?}", from, shared.mode);
            return Ok(());
        }
        self.write_mode(Mode::Idle)?;
        shared.mode = Mode::Idle;
        self.cond.notify_all();
        Ok(())
    }

    /// Record a CAD verdict and drop to standby, atomically with the
    /// still-in-CAD check. A verdict arriving after the CAD wait has moved
    /// on is dropped.
    fn finish_cad(&self, detected: bool) -> Result<(), LinkError<B::Error>> {
        let mut shared = self.lock_shared();
        if shared.mode != Mode::Cad {
            debug!("discarding CAD verdict, mode moved to {:?}", shared.mode);
            return Ok(());
        }
        shared.cad_detected = Some(detected);
        self.write_mode(Mode::Idle)?;
        shared.mode = Mode::Idle;
        self.cond.notify_all();
        Ok(())
    }

    fn write_mode(&self, mode: Mode) -> Result<(), LinkError<B::Error>> {
        let mut bus = self.lock_bus();
        bus.write_register(REG_OP_MODE, LONG_RANGE_MODE | mode.op_mode())
            .map_err(LinkError::Bus)?;
        if let Some(mapping) = mode.dio0_mapping() {
            bus.write_register(REG_DIO_MAPPING1, mapping)
                .map_err(LinkError::Bus)?;
        }
        Ok(())
    }
}

/// Bring the hardware up: LoRa sleep with readback verification, FIFO base
/// addresses, standby, modem configuration, preamble, carrier frequency and
/// TX power.
fn initialize<B: RadioRegisterIo>(
    bus: &mut B,
    config: &LinkConfig,
) -> Result<(), LinkError<B::Error>> {
    bus.write_register(REG_OP_MODE, LONG_RANGE_MODE | MODE_SLEEP)
        .map_err(LinkError::Bus)?;
    thread::sleep(MODE_SETTLE_DELAY);

    let op_mode = bus.read_register(REG_OP_MODE).map_err(LinkError::Bus)?;
    if op_mode != LONG_RANGE_MODE | MODE_SLEEP {
        return Err(LinkError::HardwareInit { op_mode });
    }

    // The whole 256-byte FIFO is used for both directions; the driver
    // repositions the pointer per packet.
    bus.write_register(REG_FIFO_TX_BASE_ADDR, 0)
        .map_err(LinkError::Bus)?;
    bus.write_register(REG_FIFO_RX_BASE_ADDR, 0)
        .map_err(LinkError::Bus)?;
    bus.write_register(REG_OP_MODE, LONG_RANGE_MODE | MODE_STDBY)
        .map_err(LinkError::Bus)?;

    let (cfg1, cfg2, cfg3) = config.modem_config.register_values();
    bus.write_register(REG_MODEM_CONFIG1, cfg1)
        .map_err(LinkError::Bus)?;
    bus.write_register(REG_MODEM_CONFIG2, cfg2)
        .map_err(LinkError::Bus)?;
    bus.write_register(REG_MODEM_CONFIG3, cfg3)
        .map_err(LinkError::Bus)?;

    bus.write_register(REG_PREAMBLE_MSB, (config.preamble_length >> 8) as u8)
        .map_err(LinkError::Bus)?;
    bus.write_register(REG_PREAMBLE_LSB, (config.preamble_length & 0xFF) as u8)
        .map_err(LinkError::Bus)?;

    let frf = ((config.frequency_mhz * 1_000_000.0) / FSTEP) as u32;
    bus.write_register(REG_FRF_MSB, ((frf >> 16) & 0xFF) as u8)
        .map_err(LinkError::Bus)?;
    bus.write_register(REG_FRF_MID, ((frf >> 8) & 0xFF) as u8)
        .map_err(LinkError::Bus)?;
    bus.write_register(REG_FRF_LSB, (frf & 0xFF) as u8)
        .map_err(LinkError::Bus)?;

    let mut power = config.tx_power_dbm.clamp(5, 23);
    if power > 20 {
        // +3 dBm from the high-power DAC, compensated in PA_CONFIG.
        bus.write_register(REG_PA_DAC, PA_DAC_ENABLE)
            .map_err(LinkError::Bus)?;
        power -= 3;
    } else {
        bus.write_register(REG_PA_DAC, PA_DAC_DISABLE)
            .map_err(LinkError::Bus)?;
    }
    bus.write_register(REG_PA_CONFIG, PA_SELECT | (power as u8 - 5))
        .map_err(LinkError::Bus)?;

    info!(
        "radio initialized: {} MHz, {:?}, {} dBm, address {}",
        config.frequency_mhz, config.modem_config, config.tx_power_dbm, config.this_address
    );
    Ok(())
}
