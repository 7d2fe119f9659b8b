//! Events that trigger watcher state transitions

use super::machine::HaltReason;

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatcherEvent {
    /// Controller published the configuration and released the watcher
    Released,
    /// Every sensor was brought up
    BringUpComplete,
    /// Unrecoverable failure; reported (or not reportable) and final
    Halt(HaltReason),
}
