//! State machine definition

use super::events::WatcherEvent;
use crate::error::{BringUpError, BusError, ErrorKind};

/// Watcher states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatcherState {
    /// Waiting for the controller to publish the configuration
    AwaitController,
    /// Resetting, configuring and validating every sensor
    BringUp,
    /// Polling events and sampling the watchdog
    Monitor,
    /// Stopped; only the controller can restart the watcher
    Halted(HaltReason),
}

/// Why the watcher stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HaltReason {
    /// Shared memory did not hold a usable configuration
    InvalidConfiguration,
    /// A sensor failed bring-up
    BringUpFailed {
        /// Index into the sensor address list
        address_index: u8,
        /// What went wrong
        error: BringUpError,
    },
    /// Watchdog samples kept failing
    SensorLost {
        /// Index into the sensor address list
        address_index: u8,
        /// Last failure
        error: BusError,
    },
    /// The wait policy gave up on the controller
    ControllerUnresponsive,
}

impl HaltReason {
    /// Classification of the failure, if it came from a sensor
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::BringUpFailed { error, .. } => Some(error.kind()),
            Self::SensorLost { error, .. } => Some(error.kind()),
            Self::InvalidConfiguration | Self::ControllerUnresponsive => None,
        }
    }
}

impl WatcherState {
    /// Check if this is the terminal state
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted(_))
    }

    /// Process an event and return the next state
    pub fn transition(self, event: WatcherEvent) -> Self {
        use WatcherEvent::*;
        use WatcherState::*;

        match (self, event) {
            (AwaitController, Released) => BringUp,
            (AwaitController, Halt(reason)) => Halted(reason),

            (BringUp, BringUpComplete) => Monitor,
            (BringUp, Halt(reason)) => Halted(reason),

            (Monitor, Halt(reason)) => Halted(reason),

            // Halted is final; everything else is ignored
            _ => self,
        }
    }
}
