//! Register-level hardware capability.
//!
//! The link layer never talks SPI or GPIO directly; it consumes a
//! [`RadioRegisterIo`] implementation that owns the bus and the interrupt
//! line. On a Raspberry Pi this would wrap an spidev handle plus a GPIO
//! edge-detection thread; tests use a scripted mock.

use std::fmt;

/// Callback invoked on a rising edge of the radio interrupt line.
///
/// The capability must invoke it on its own thread of execution, never
/// reentrantly from within a register access.
pub type InterruptCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Raw register access to the radio plus interrupt registration.
pub trait RadioRegisterIo: Send + 'static {
    /// Bus-level error type.
    type Error: fmt::Debug + Send + 'static;

    /// Read a single register.
    fn read_register(&mut self, reg: u8) -> Result<u8, Self::Error>;

    /// Write a single register.
    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Self::Error>;

    /// Write consecutive bytes starting at `reg` (FIFO-style burst).
    fn burst_write(&mut self, reg: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read `len` consecutive bytes starting at `reg`.
    fn burst_read(&mut self, reg: u8, len: usize) -> Result<Vec<u8>, Self::Error>;

    /// Register a callback for rising edges on the given pin.
    fn on_rising_edge(&mut self, pin: u8, callback: InterruptCallback) -> Result<(), Self::Error>;
}
