//! Board-agnostic core logic for the Vigil sensor watcher
//!
//! This crate contains all watcher and controller logic that does not depend
//! on specific hardware implementations:
//!
//! - Shared configuration types and validation
//! - Register-level sensor bus access
//! - Sensor bring-up, event polling and watchdog timing
//! - Four-phase handshake over two level lines and a single-slot mailbox
//! - Watcher state machine and main loop
//! - Controller-side release, servicing and restart policy

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod bus;
pub mod config;
pub mod controller;
pub mod error;
pub mod handshake;
pub mod sensor;
pub mod state;
pub mod watcher;

pub use bus::SensorBus;
pub use config::{ConfigError, DeviceCommands, SharedConfiguration, WatcherOptions};
pub use controller::{ControllerAgent, ControllerState, Report, RestartPolicy, StatusSink};
pub use error::{BringUpError, BringUpStage, BusError, ErrorKind, RegisterMismatch};
pub use handshake::{HandshakeChannel, HandshakeError, HandshakeMessage, Mailbox, Phase, Status};
pub use sensor::DeviceState;
pub use state::{HaltReason, WatcherEvent, WatcherState};
pub use watcher::Watcher;
