//! Hardware driver implementations
//!
//! This crate provides concrete pieces for the traits and types defined in
//! vigil-core and vigil-hal:
//!
//! - Sensor profiles (BMI160 register map and default supervision setup)
//! - Adapters from `embedded-hal` 1.0 I2C, GPIO and delay drivers

#![no_std]
#![deny(unsafe_code)]

pub mod embedded;
pub mod sensor;

pub use embedded::{EhDelay, EhI2c, EhI2cError, EhInput, EhOutput};
pub use sensor::bmi160;
