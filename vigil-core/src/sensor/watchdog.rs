//! Watchdog timing from the sensor's free-running counter
//!
//! The counter is 24 bits wide, spread over three registers read least
//! significant byte first. An interval is overdue when the counter went
//! backwards (it wrapped) or advanced by more than the threshold.

use vigil_hal::I2cBus;
use vigil_protocol::TIMER_REGISTER_COUNT;

use crate::bus::SensorBus;
use crate::config::SharedConfiguration;
use crate::error::BusError;

/// Whether the counter moved from `previous` to `current` too slowly
///
/// A backwards step is a wrap and always counts as overdue.
pub const fn is_overdue(previous: u32, current: u32, threshold: u32) -> bool {
    current < previous || current - previous > threshold
}

/// Result of one counter sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sample {
    /// Counter value, or the previous value if the read failed
    pub value: u32,
    /// Whether the interval since `previous` exceeds the threshold
    pub overdue: bool,
    /// Read failure, if any
    pub error: Option<BusError>,
}

/// Reads the 24-bit counter of one sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchdogTimer {
    address: u8,
    registers: [u8; TIMER_REGISTER_COUNT],
    threshold: u32,
}

impl WatchdogTimer {
    /// Create a timer reading `registers` on the sensor at `address`
    pub const fn new(address: u8, registers: [u8; TIMER_REGISTER_COUNT], threshold: u32) -> Self {
        Self {
            address,
            registers,
            threshold,
        }
    }

    /// Timer on the first configured sensor
    pub fn from_config(config: &SharedConfiguration) -> Option<Self> {
        config.watchdog_address().map(|address| {
            Self::new(address, config.timer_registers, config.watchdog_threshold)
        })
    }

    /// Sensor address the counter is read from
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Ticks allowed between check-ins
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Read the counter registers in order and pack them little-endian
    pub fn read_counter<B: I2cBus>(&self, bus: &mut SensorBus<B>) -> Result<u32, BusError> {
        let mut bytes = [0u8; 4];
        for (byte, &register) in bytes.iter_mut().zip(&self.registers) {
            *byte = bus.read_register(self.address, register)?;
        }
        Ok(u32::from_le_bytes(bytes))
    }

    /// Sample the counter against `previous`
    ///
    /// On a bus error the previous value is kept and the sample is never
    /// overdue.
    pub fn sample<B: I2cBus>(&self, bus: &mut SensorBus<B>, previous: u32) -> Sample {
        match self.read_counter(bus) {
            Ok(value) => Sample {
                value,
                overdue: is_overdue(previous, value, self.threshold),
                error: None,
            },
            Err(error) => Sample {
                value: previous,
                overdue: false,
                error: Some(error),
            },
        }
    }
}

/// What the watcher should do with a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockVerdict {
    /// First good sample; it became the reference
    Seeded(u32),
    /// Within the threshold
    OnTime,
    /// Past the threshold; check in with this value
    Overdue(u32),
    /// Sample failed
    Missed {
        /// Failures in a row, including this one
        consecutive: u8,
        /// Cause of this failure
        error: BusError,
    },
}

/// Watcher-owned watchdog reference
///
/// Holds the counter value of the last check-in. The reference only moves
/// when the watcher commits a check-in, so an overdue interval that could
/// not be reported is reported again on the next sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WatchdogClock {
    reference: Option<u32>,
    failures: u8,
}

impl WatchdogClock {
    /// Unseeded clock
    pub const fn new() -> Self {
        Self {
            reference: None,
            failures: 0,
        }
    }

    /// Value to pass as `previous` to [`WatchdogTimer::sample`]
    pub fn previous(&self) -> u32 {
        self.reference.unwrap_or(0)
    }

    /// Whether a reference has been taken
    pub fn is_seeded(&self) -> bool {
        self.reference.is_some()
    }

    /// Failed samples in a row
    pub fn consecutive_failures(&self) -> u8 {
        self.failures
    }

    /// Classify a sample
    ///
    /// The first good sample after [`reset`](Self::reset) seeds the reference
    /// and is never overdue.
    pub fn observe(&mut self, sample: Sample) -> ClockVerdict {
        if let Some(error) = sample.error {
            self.failures = self.failures.saturating_add(1);
            return ClockVerdict::Missed {
                consecutive: self.failures,
                error,
            };
        }
        self.failures = 0;

        match self.reference {
            None => {
                self.reference = Some(sample.value);
                ClockVerdict::Seeded(sample.value)
            }
            Some(_) if sample.overdue => ClockVerdict::Overdue(sample.value),
            Some(_) => ClockVerdict::OnTime,
        }
    }

    /// Commit a check-in at `value`
    pub fn checkin(&mut self, value: u32) {
        self.reference = Some(value);
    }

    /// Forget the reference and failure count
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
