//! Watcher timing options
//!
//! All delays are in processor cycles as counted by the watcher's
//! [`DelayCycles`](vigil_hal::DelayCycles) implementation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::handshake::Forever;

/// Settle time after the device reset command
pub const DEFAULT_SETTLE_CYCLES: u32 = 100_000;

/// Delay between monitor iterations
pub const DEFAULT_POLL_PERIOD_CYCLES: u32 = 100_000;

/// Pause between checks of a handshake line
pub const DEFAULT_WAIT_SPIN_CYCLES: u32 = 10_000;

/// Delay before the watcher starts listening for the controller
pub const DEFAULT_POWER_ON_CYCLES: u32 = 20_000_000;

/// Consecutive failed watchdog samples treated as a lost sensor
pub const DEFAULT_MAX_SAMPLE_FAILURES: u8 = 3;

/// Watcher timing and fault-tolerance options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WatcherOptions {
    /// Settle time after the device reset command
    pub settle_cycles: u32,
    /// Delay after each monitor iteration
    pub poll_period_cycles: u32,
    /// Pause between checks of a handshake line
    pub wait_spin_cycles: u32,
    /// Delay before listening for the controller
    pub power_on_cycles: u32,
    /// Consecutive failed watchdog samples before the watcher halts
    pub max_sample_failures: u8,
}

impl Default for WatcherOptions {
    fn default() -> Self {
        Self {
            settle_cycles: DEFAULT_SETTLE_CYCLES,
            poll_period_cycles: DEFAULT_POLL_PERIOD_CYCLES,
            wait_spin_cycles: DEFAULT_WAIT_SPIN_CYCLES,
            power_on_cycles: DEFAULT_POWER_ON_CYCLES,
            max_sample_failures: DEFAULT_MAX_SAMPLE_FAILURES,
        }
    }
}

impl WatcherOptions {
    /// Options with every delay removed, for simulation
    pub const fn immediate() -> Self {
        Self {
            settle_cycles: 0,
            poll_period_cycles: 0,
            wait_spin_cycles: 0,
            power_on_cycles: 0,
            max_sample_failures: DEFAULT_MAX_SAMPLE_FAILURES,
        }
    }

    /// Unbounded handshake wait pausing `wait_spin_cycles` between checks
    pub const fn wait_policy(&self) -> Forever {
        Forever::new(self.wait_spin_cycles)
    }
}
