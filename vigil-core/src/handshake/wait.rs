//! Busy-wait helper
//!
//! Every wait on a handshake line goes through [`poll_until`] (or its async
//! twin), and the [`WaitPolicy`] passed in is the one place that decides
//! whether a wait may give up.

use vigil_hal::{DelayCycles, NoDelay};

/// The wait policy gave up before the condition held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WaitAbandoned;

impl core::fmt::Display for WaitAbandoned {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "wait abandoned")
    }
}

impl core::error::Error for WaitAbandoned {}

/// Decides how long a wait may last
///
/// A policy value describes one wait; callers copy it fresh for each wait.
pub trait WaitPolicy: Copy {
    /// Called after every failed check
    ///
    /// May pause through `delay`. Returns `false` to abandon the wait.
    fn keep_waiting<D: DelayCycles>(&mut self, delay: &mut D) -> bool;
}

/// Wait as long as it takes, pausing between checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Forever {
    /// Pause between checks
    pub spin_cycles: u32,
}

impl Forever {
    /// Unbounded wait pausing `spin_cycles` between checks
    pub const fn new(spin_cycles: u32) -> Self {
        Self { spin_cycles }
    }
}

impl WaitPolicy for Forever {
    fn keep_waiting<D: DelayCycles>(&mut self, delay: &mut D) -> bool {
        delay.delay_cycles(self.spin_cycles);
        true
    }
}

/// Give up after a fixed number of failed checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Attempts {
    /// Checks still allowed to fail
    pub remaining: u32,
    /// Pause between checks
    pub spin_cycles: u32,
}

impl Attempts {
    /// Allow `attempts` failed checks
    pub const fn new(attempts: u32, spin_cycles: u32) -> Self {
        Self {
            remaining: attempts,
            spin_cycles,
        }
    }
}

impl WaitPolicy for Attempts {
    fn keep_waiting<D: DelayCycles>(&mut self, delay: &mut D) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        delay.delay_cycles(self.spin_cycles);
        true
    }
}

/// Spin until `condition` holds or `policy` gives up
pub fn poll_until<P, D, F>(mut condition: F, mut policy: P, delay: &mut D) -> Result<(), WaitAbandoned>
where
    P: WaitPolicy,
    D: DelayCycles,
    F: FnMut() -> bool,
{
    while !condition() {
        if !policy.keep_waiting(delay) {
            return Err(WaitAbandoned);
        }
    }
    Ok(())
}

/// Async [`poll_until`]: yields to the executor between checks
///
/// Pauses requested by the policy are skipped; yielding takes their place.
pub async fn poll_until_async<P, F>(mut condition: F, mut policy: P) -> Result<(), WaitAbandoned>
where
    P: WaitPolicy,
    F: FnMut() -> bool,
{
    while !condition() {
        if !policy.keep_waiting(&mut NoDelay) {
            return Err(WaitAbandoned);
        }
        embassy_futures::yield_now().await;
    }
    Ok(())
}
