//! Vigil Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the watcher and controller logic
//! is written against. A chip-specific HAL (or the `embedded-hal` adapters in
//! `vigil-drivers`) implements them; host tests implement them in memory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  vigil-core (watcher loop, controller)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  vigil-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embedded-hal  │       │  in-memory    │
//! │   adapters    │       │  test doubles │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Handshake signal lines
//! - [`i2c::I2cBus`] - Sensor bus operations
//! - [`delay::DelayCycles`] - Cycle-counted busy delays

#![no_std]
#![deny(unsafe_code)]

pub mod delay;
pub mod gpio;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use delay::{DelayCycles, NoDelay};
pub use gpio::{InputPin, LevelLine, OutputPin};
pub use i2c::{I2cBus, I2cError, I2cErrorKind};
