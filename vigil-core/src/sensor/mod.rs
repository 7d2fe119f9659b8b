//! Sensor supervision building blocks
//!
//! Each component borrows the [`SensorBus`](crate::SensorBus) per call and
//! keeps no device state between calls, so a watcher restart always starts
//! from a clean bring-up.

pub mod engine;
pub mod poller;
pub mod watchdog;

pub use engine::{DeviceState, SensorConfigEngine};
pub use poller::{EventPoller, Trip};
pub use watchdog::{ClockVerdict, Sample, WatchdogClock, WatchdogTimer};
