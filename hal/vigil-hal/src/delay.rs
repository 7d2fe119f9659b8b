//! Busy-wait delay abstraction
//!
//! The watcher has no timer peripheral of its own; every pause is a
//! cycle-counted busy delay on its own core clock.

/// Cycle-counted blocking delay
pub trait DelayCycles {
    /// Block for approximately `cycles` core clock cycles
    fn delay_cycles(&mut self, cycles: u32);
}

impl<T: DelayCycles + ?Sized> DelayCycles for &mut T {
    fn delay_cycles(&mut self, cycles: u32) {
        (**self).delay_cycles(cycles);
    }
}

/// Delay that returns immediately
///
/// Useful on hosts where the other context is a thread and pacing only
/// slows the simulation down.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayCycles for NoDelay {
    fn delay_cycles(&mut self, _cycles: u32) {}
}
