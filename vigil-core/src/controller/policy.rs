//! Restart policy for a halted watcher

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Restarts allowed before the device is declared degraded
pub const DEFAULT_MAX_RESTARTS: u8 = 3;

/// What the controller does next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerAction {
    /// Keep servicing reports
    Continue,
    /// Reload the watcher and release it again
    RestartWatcher,
    /// Stop supervising; the device stays degraded but safe
    Degrade,
}

/// Bounded restart budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RestartPolicy {
    /// Restarts allowed in total
    pub max_restarts: u8,
    /// Restarts used so far
    #[cfg_attr(feature = "serde", serde(skip))]
    restarts: u8,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESTARTS)
    }
}

impl RestartPolicy {
    /// Allow `max_restarts` restarts
    pub const fn new(max_restarts: u8) -> Self {
        Self {
            max_restarts,
            restarts: 0,
        }
    }

    /// Never restart
    pub const fn never() -> Self {
        Self::new(0)
    }

    /// Restarts used so far
    pub fn restarts(&self) -> u8 {
        self.restarts
    }

    /// Decide what to do after the watcher halted
    pub fn on_halt(&mut self) -> ControllerAction {
        if self.restarts < self.max_restarts {
            self.restarts += 1;
            ControllerAction::RestartWatcher
        } else {
            ControllerAction::Degrade
        }
    }

    /// Give the full budget back
    pub fn reset(&mut self) {
        self.restarts = 0;
    }
}
