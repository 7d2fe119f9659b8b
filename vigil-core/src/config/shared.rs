//! Controller-written shared configuration
//!
//! Everything the watcher needs to supervise its sensors. The controller
//! fills it in completely, publishes it as an image, and only then releases
//! the watcher; from that point on it is read-only.

use heapless::Vec;
use vigil_protocol::{
    decode_image, encode_image, EventMask, ImageError, ImageFields, RegisterWrite,
    MAX_CONFIG_ENTRIES, MAX_EVENT_MASKS, MAX_SENSORS, TIMER_REGISTER_COUNT,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered (register, value) pairs programmed into every sensor
pub type ConfigTable = Vec<RegisterWrite, MAX_CONFIG_ENTRIES>;

/// Sensor bus addresses, in supervision order
pub type SensorAddresses = Vec<u8, MAX_SENSORS>;

/// Ordered (register, mask) pairs the watcher polls
pub type EventMasks = Vec<EventMask, MAX_EVENT_MASKS>;

/// Highest valid 7-bit bus address
const MAX_BUS_ADDRESS: u8 = 0x7F;

/// Configuration problems found before release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// More than 32 configuration entries
    TableFull,
    /// More than 2 sensor addresses
    TooManySensors,
    /// More than 32 event masks
    TooManyMasks,
    /// Configuration table is empty
    EmptyTable,
    /// No sensor address given
    NoSensors,
    /// No event mask given
    NoMasks,
    /// The same address appears twice
    DuplicateSensor(u8),
    /// Address does not fit in 7 bits
    InvalidAddress(u8),
    /// Watchdog threshold of zero ticks
    ZeroThreshold,
    /// Shared-memory image could not be read or written
    Image(ImageError),
}

impl From<ImageError> for ConfigError {
    fn from(err: ImageError) -> Self {
        Self::Image(err)
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TableFull => write!(f, "more than {MAX_CONFIG_ENTRIES} config entries"),
            Self::TooManySensors => write!(f, "more than {MAX_SENSORS} sensor addresses"),
            Self::TooManyMasks => write!(f, "more than {MAX_EVENT_MASKS} event masks"),
            Self::EmptyTable => write!(f, "config table is empty"),
            Self::NoSensors => write!(f, "no sensor address"),
            Self::NoMasks => write!(f, "no event mask"),
            Self::DuplicateSensor(a) => write!(f, "sensor address 0x{a:02X} listed twice"),
            Self::InvalidAddress(a) => write!(f, "0x{a:02X} is not a 7-bit address"),
            Self::ZeroThreshold => write!(f, "watchdog threshold is zero"),
            Self::Image(err) => write!(f, "image: {err}"),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Device command pair used during bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DeviceCommands {
    /// Soft reset, issued before configuration
    pub reboot: RegisterWrite,
    /// Start measuring, issued after validation
    pub start: RegisterWrite,
}

impl Default for DeviceCommands {
    fn default() -> Self {
        Self {
            reboot: RegisterWrite::new(0x7E, 0xB6),
            start: RegisterWrite::new(0x7E, 0x11),
        }
    }
}

/// Everything the watcher reads from shared memory
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SharedConfiguration {
    /// Register values programmed into every sensor, in order
    pub config_table: ConfigTable,
    /// Sensor bus addresses
    pub addresses: SensorAddresses,
    /// Event masks, checked in order
    pub event_masks: EventMasks,
    /// Counter registers, least significant byte first
    pub timer_registers: [u8; TIMER_REGISTER_COUNT],
    /// Ticks allowed between watchdog check-ins
    pub watchdog_threshold: u32,
    /// Reset and start commands
    #[cfg_attr(feature = "serde", serde(default))]
    pub commands: DeviceCommands,
}

impl SharedConfiguration {
    /// Start building a configuration
    pub fn builder() -> SharedConfigurationBuilder {
        SharedConfigurationBuilder::new()
    }

    /// Check that the configuration is complete enough to release the watcher
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.config_table.is_empty() {
            return Err(ConfigError::EmptyTable);
        }
        if self.addresses.is_empty() {
            return Err(ConfigError::NoSensors);
        }
        if self.event_masks.is_empty() {
            return Err(ConfigError::NoMasks);
        }
        for (i, &address) in self.addresses.iter().enumerate() {
            if address > MAX_BUS_ADDRESS {
                return Err(ConfigError::InvalidAddress(address));
            }
            if self.addresses[..i].contains(&address) {
                return Err(ConfigError::DuplicateSensor(address));
            }
        }
        if self.watchdog_threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        Ok(())
    }

    /// Address whose counter drives the watchdog
    pub fn watchdog_address(&self) -> Option<u8> {
        self.addresses.first().copied()
    }

    /// Validate and write the shared-memory image
    ///
    /// Returns the number of bytes written.
    pub fn write_image(&self, buffer: &mut [u8]) -> Result<usize, ConfigError> {
        self.validate()?;
        let fields = ImageFields {
            config: &self.config_table,
            addresses: &self.addresses,
            masks: &self.event_masks,
            timer_registers: self.timer_registers,
            threshold: self.watchdog_threshold,
            start_command: self.commands.start,
            reboot_command: self.commands.reboot,
        };
        Ok(encode_image(&fields, buffer)?)
    }

    /// Read and validate a shared-memory image
    pub fn from_image(buffer: &[u8]) -> Result<Self, ConfigError> {
        let image = decode_image(buffer)?;
        let config = Self {
            config_table: image.config,
            addresses: image.addresses,
            event_masks: image.masks,
            timer_registers: image.timer_registers,
            watchdog_threshold: image.threshold,
            commands: DeviceCommands {
                reboot: image.reboot_command,
                start: image.start_command,
            },
        };
        config.validate()?;
        Ok(config)
    }
}

/// Builder for [`SharedConfiguration`]
///
/// Capacity overflows are remembered and reported by [`build`](Self::build),
/// so calls can be chained without checking each one.
#[derive(Debug, Clone)]
pub struct SharedConfigurationBuilder {
    config: SharedConfiguration,
    overflow: Option<ConfigError>,
}

impl Default for SharedConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedConfigurationBuilder {
    /// Empty builder with default commands and no threshold
    pub fn new() -> Self {
        Self {
            config: SharedConfiguration {
                config_table: Vec::new(),
                addresses: Vec::new(),
                event_masks: Vec::new(),
                timer_registers: [0; TIMER_REGISTER_COUNT],
                watchdog_threshold: 0,
                commands: DeviceCommands::default(),
            },
            overflow: None,
        }
    }

    fn note(&mut self, result: Result<(), impl Sized>, err: ConfigError) {
        if result.is_err() && self.overflow.is_none() {
            self.overflow = Some(err);
        }
    }

    /// Append a configuration entry
    pub fn entry(mut self, register: u8, value: u8) -> Self {
        let pushed = self
            .config
            .config_table
            .push(RegisterWrite::new(register, value));
        self.note(pushed, ConfigError::TableFull);
        self
    }

    /// Append every entry of a table
    pub fn entries(mut self, table: &[RegisterWrite]) -> Self {
        for entry in table {
            self = self.entry(entry.register, entry.value);
        }
        self
    }

    /// Add a sensor address
    pub fn address(mut self, address: u8) -> Self {
        let pushed = self.config.addresses.push(address);
        self.note(pushed, ConfigError::TooManySensors);
        self
    }

    /// Append an event mask
    pub fn mask(mut self, register: u8, mask: u8) -> Self {
        let pushed = self.config.event_masks.push(EventMask::new(register, mask));
        self.note(pushed, ConfigError::TooManyMasks);
        self
    }

    /// Append every mask of a list
    pub fn masks(mut self, masks: &[EventMask]) -> Self {
        for mask in masks {
            self = self.mask(mask.register, mask.mask);
        }
        self
    }

    /// Set the counter registers, least significant byte first
    pub fn timer_registers(mut self, registers: [u8; TIMER_REGISTER_COUNT]) -> Self {
        self.config.timer_registers = registers;
        self
    }

    /// Set the watchdog threshold in counter ticks
    pub fn watchdog_threshold(mut self, ticks: u32) -> Self {
        self.config.watchdog_threshold = ticks;
        self
    }

    /// Set the reset and start commands
    pub fn commands(mut self, commands: DeviceCommands) -> Self {
        self.config.commands = commands;
        self
    }

    /// Finish and validate
    pub fn build(self) -> Result<SharedConfiguration, ConfigError> {
        if let Some(err) = self.overflow {
            return Err(err);
        }
        self.config.validate()?;
        Ok(self.config)
    }
}
