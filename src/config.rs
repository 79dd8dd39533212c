//! Link configuration and modem presets.
//!
//! [`LinkConfig`] collects everything [`RadioLink`](crate::link::RadioLink)
//! needs at construction: addressing, RF parameters, and the protocol
//! timeouts.

use std::time::Duration;

/// Modem configuration presets.
///
/// Each preset is a `(RegModemConfig1, RegModemConfig2, RegModemConfig3)`
/// register triple. Both ends of a link must use the same preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemConfig {
    /// 125 kHz bandwidth, 4/5 coding rate, SF7 (128 chips/symbol).
    /// The default: medium range, medium speed.
    Bw125Cr45Sf128,
    /// 500 kHz bandwidth, 4/5 coding rate, SF7. Fast, short range.
    Bw500Cr45Sf128,
    /// 31.25 kHz bandwidth, 4/8 coding rate, SF9 (512 chips/symbol).
    Bw31_25Cr48Sf512,
    /// 125 kHz bandwidth, 4/8 coding rate, SF12 (4096 chips/symbol).
    /// Slow, maximum range.
    Bw125Cr48Sf4096,
}

impl ModemConfig {
    /// Register values for `RegModemConfig1`, `RegModemConfig2` and
    /// `RegModemConfig3`.
    pub fn register_values(self) -> (u8, u8, u8) {
        match self {
            Self::Bw125Cr45Sf128 => (0x72, 0x74, 0x04),
            Self::Bw500Cr45Sf128 => (0x92, 0x74, 0x04),
            Self::Bw31_25Cr48Sf512 => (0x48, 0x94, 0x04),
            Self::Bw125Cr48Sf4096 => (0x78, 0xC4, 0x0C),
        }
    }
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self::Bw125Cr45Sf128
    }
}

/// Errors from [`LinkConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration parameter.
    InvalidConfig(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid link config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Radio link configuration.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Our own node address. 255 is reserved for broadcast.
    pub this_address: u8,

    /// GPIO pin carrying the radio's DIO0 interrupt line.
    pub interrupt_pin: u8,

    /// Carrier frequency in MHz.
    pub frequency_mhz: f64,

    /// Transmit power in dBm, clamped to 5..=23 at init. Powers above 20
    /// enable the PA_DAC high-power mode.
    pub tx_power_dbm: i8,

    /// Modem preset (bandwidth / coding rate / spreading factor).
    pub modem_config: ModemConfig,

    /// Preamble length in symbols.
    pub preamble_length: u16,

    /// Automatically acknowledge unicast frames addressed to us.
    pub acks_enabled: bool,

    /// Accept frames regardless of their destination address. Foreign
    /// frames are delivered but never auto-acked.
    pub receive_all: bool,

    /// Total time budget for channel activity detection before a send.
    /// Defaults to 1 s; zero disables CAD entirely.
    pub cad_timeout: Duration,

    /// Base ACK wait per attempt in `send_to_wait`. The actual wait is
    /// randomized to `retry_timeout * (1 + U(0,1))` to decorrelate retries.
    pub retry_timeout: Duration,

    /// How long to wait for an in-flight transmission to finish before
    /// reusing the FIFO.
    pub wait_packet_sent_timeout: Duration,
}

impl LinkConfig {
    /// Create a configuration for the given address and interrupt pin,
    /// with defaults for everything else.
    pub fn new(this_address: u8, interrupt_pin: u8) -> Self {
        Self {
            this_address,
            interrupt_pin,
            frequency_mhz: 915.0,
            tx_power_dbm: 14,
            modem_config: ModemConfig::default(),
            preamble_length: 8,
            acks_enabled: false,
            receive_all: false,
            cad_timeout: Duration::from_secs(1),
            retry_timeout: Duration::from_millis(200),
            wait_packet_sent_timeout: Duration::from_millis(500),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.this_address == crate::frame::BROADCAST_ADDRESS {
            return Err(ConfigError::InvalidConfig(
                "this_address 255 is reserved for broadcast",
            ));
        }
        if !(137.0..=1020.0).contains(&self.frequency_mhz) {
            return Err(ConfigError::InvalidConfig(
                "frequency_mhz must be within 137..=1020 MHz",
            ));
        }
        if self.retry_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig("retry_timeout must be > 0"));
        }
        if self.wait_packet_sent_timeout.is_zero() {
            return Err(ConfigError::InvalidConfig(
                "wait_packet_sent_timeout must be > 0",
            ));
        }
        if self.preamble_length == 0 {
            return Err(ConfigError::InvalidConfig("preamble_length must be > 0"));
        }
        Ok(())
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LinkConfig::new(2, 17);
        assert_eq!(config.this_address, 2);
        assert_eq!(config.interrupt_pin, 17);
        assert_eq!(config.frequency_mhz, 915.0);
        assert_eq!(config.tx_power_dbm, 14);
        assert_eq!(config.modem_config, ModemConfig::Bw125Cr45Sf128);
        assert_eq!(config.retry_timeout, Duration::from_millis(200));
        assert_eq!(config.wait_packet_sent_timeout, Duration::from_millis(500));
        assert_eq!(config.cad_timeout, Duration::from_secs(1));
        assert!(!config.acks_enabled);
        assert!(!config.receive_all);
    }

    #[test]
    fn test_validation_valid() {
        assert!(LinkConfig::new(2, 17).validate().is_ok());
    }

    #[test]
    fn test_validation_broadcast_address() {
        let config = LinkConfig::new(255, 17);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validation_frequency_out_of_range() {
        let mut config = LinkConfig::new(2, 17);
        config.frequency_mhz = 100.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));

        config.frequency_mhz = 2400.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validation_zero_timeouts() {
        let mut config = LinkConfig::new(2, 17);
        config.retry_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = LinkConfig::new(2, 17);
        config.wait_packet_sent_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_cad_disabled_is_valid() {
        // cad_timeout == 0 means CAD is skipped, not misconfigured
        let mut config = LinkConfig::new(2, 17);
        config.cad_timeout = Duration::ZERO;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_modem_preset_registers() {
        assert_eq!(
            ModemConfig::Bw125Cr45Sf128.register_values(),
            (0x72, 0x74, 0x04)
        );
        assert_eq!(
            ModemConfig::Bw500Cr45Sf128.register_values(),
            (0x92, 0x74, 0x04)
        );
        assert_eq!(
            ModemConfig::Bw31_25Cr48Sf512.register_values(),
            (0x48, 0x94, 0x04)
        );
        assert_eq!(
            ModemConfig::Bw125Cr48Sf4096.register_values(),
            (0x78, 0xC4, 0x0C)
        );
    }

    #[test]
    fn test_default_preset() {
        assert_eq!(ModemConfig::default(), ModemConfig::Bw125Cr45Sf128);
    }
}
