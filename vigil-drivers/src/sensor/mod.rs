//! Sensor profiles

pub mod bmi160;
