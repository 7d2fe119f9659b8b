//! Bosch BMI160 inertial measurement unit
//!
//! Register map, commands and the default supervision profile: accelerometer
//! in normal mode, latched any-motion and low-g interrupts, and the
//! free-running sensor time counter as the watchdog clock.
//!
//! # Sensor time
//!
//! `SENSORTIME_0..2` form a 24-bit counter ticking every 39.0625 µs
//! (625/16 µs), so one second is a little over 25 600 ticks.

use vigil_core::config::{
    ConfigError, DeviceCommands, SharedConfiguration, SharedConfigurationBuilder,
};
use vigil_protocol::{EventMask, RegisterWrite};

/// BMI160 register addresses
pub mod reg {
    /// Chip identification
    pub const CHIP_ID: u8 = 0x00;
    /// Error flags
    pub const ERR_REG: u8 = 0x02;
    /// Power mode status
    pub const PMU_STATUS: u8 = 0x03;
    /// Sensor time, bits 0..7
    pub const SENSORTIME_0: u8 = 0x18;
    /// Sensor time, bits 8..15
    pub const SENSORTIME_1: u8 = 0x19;
    /// Sensor time, bits 16..23
    pub const SENSORTIME_2: u8 = 0x1A;
    /// Interrupt status (any-motion, tap, orientation)
    pub const INT_STATUS_0: u8 = 0x1C;
    /// Interrupt status (low-g, high-g, data ready)
    pub const INT_STATUS_1: u8 = 0x1D;
    /// Temperature, low byte
    pub const TEMPERATURE_0: u8 = 0x20;
    /// Temperature, high byte
    pub const TEMPERATURE_1: u8 = 0x21;
    /// Accelerometer output data rate and bandwidth
    pub const ACC_CONF: u8 = 0x40;
    /// Accelerometer range
    pub const ACC_RANGE: u8 = 0x41;
    /// Interrupt enable, group 0
    pub const INT_EN_0: u8 = 0x50;
    /// Interrupt enable, group 1
    pub const INT_EN_1: u8 = 0x51;
    /// Interrupt enable, group 2
    pub const INT_EN_2: u8 = 0x52;
    /// Interrupt pin electrical behaviour
    pub const INT_OUT_CTRL: u8 = 0x53;
    /// Interrupt latch mode
    pub const INT_LATCH: u8 = 0x54;
    /// Interrupt map, INT1
    pub const INT_MAP_0: u8 = 0x55;
    /// Interrupt map, data ready
    pub const INT_MAP_1: u8 = 0x56;
    /// Interrupt map, INT2
    pub const INT_MAP_2: u8 = 0x57;
    /// Interrupt data source, tap / low-high
    pub const INT_DATA_0: u8 = 0x58;
    /// Interrupt data source, motion
    pub const INT_DATA_1: u8 = 0x59;
    /// Low-g duration
    pub const INT_LOWHIGH_0: u8 = 0x5A;
    /// Low-g threshold
    pub const INT_LOWHIGH_1: u8 = 0x5B;
    /// Low-g hysteresis and mode
    pub const INT_LOWHIGH_2: u8 = 0x5C;
    /// High-g duration
    pub const INT_LOWHIGH_3: u8 = 0x5D;
    /// Any-motion duration
    pub const INT_MOTION_0: u8 = 0x5F;
    /// Any-motion threshold
    pub const INT_MOTION_1: u8 = 0x60;
    /// No-motion threshold
    pub const INT_MOTION_2: u8 = 0x61;
    /// Motion detection options
    pub const INT_MOTION_3: u8 = 0x62;
    /// Command register
    pub const CMD: u8 = 0x7E;
}

/// Opcodes for [`reg::CMD`]
pub mod cmd {
    /// Accelerometer to normal mode
    pub const START_ACCEL: u8 = 0x11;
    /// Clear latched interrupts
    pub const RESET_INTERRUPTS: u8 = 0xB1;
    /// Soft reset
    pub const SOFT_RESET: u8 = 0xB6;
}

/// Address with SDO pulled low
pub const ADDRESS_PRIMARY: u8 = 0x68;

/// Address with SDO pulled high
pub const ADDRESS_SECONDARY: u8 = 0x69;

/// Expected [`reg::CHIP_ID`] value
pub const CHIP_ID: u8 = 0xD1;

/// Counter registers, least significant byte first
pub const TIMER_REGISTERS: [u8; 3] = [reg::SENSORTIME_0, reg::SENSORTIME_1, reg::SENSORTIME_2];

/// About one second of sensor time
pub const DEFAULT_WATCHDOG_THRESHOLD: u32 = 25_640;

/// Sensor time ticks in `ms` milliseconds
pub const fn ticks_from_ms(ms: u32) -> u32 {
    // 1 tick = 625/16 µs
    ((ms as u64 * 1000 * 16) / 625) as u32
}

/// Start measuring
pub const START_ACCEL: RegisterWrite = RegisterWrite::new(reg::CMD, cmd::START_ACCEL);

/// Soft reset
pub const SOFT_RESET: RegisterWrite = RegisterWrite::new(reg::CMD, cmd::SOFT_RESET);

/// Reset and start commands used during bring-up
pub const COMMANDS: DeviceCommands = DeviceCommands {
    reboot: SOFT_RESET,
    start: START_ACCEL,
};

/// Readable status bits worth watching
pub mod mask {
    use super::reg;
    use vigil_protocol::EventMask;

    /// A command was dropped
    pub const DROPPED_COMMAND: EventMask = EventMask::new(reg::ERR_REG, 0x40);
    /// Non-zero error code
    pub const ERROR_CODE: EventMask = EventMask::new(reg::ERR_REG, 0x0E);
    /// Chip not operable
    pub const FATAL_ERROR: EventMask = EventMask::new(reg::ERR_REG, 0x01);
    /// Accelerometer in normal power mode
    pub const ACCEL_PMU_NORMAL: EventMask = EventMask::new(reg::PMU_STATUS, 0x10);
    /// Any-motion interrupt latched
    pub const ANY_MOTION: EventMask = EventMask::new(reg::INT_STATUS_0, 0x04);
    /// Low-g interrupt latched
    pub const LOW_G: EventMask = EventMask::new(reg::INT_STATUS_1, 0x08);
    /// Any temperature bit, low byte
    pub const TEMPERATURE_0: EventMask = EventMask::new(reg::TEMPERATURE_0, 0xFF);
    /// Any temperature bit, high byte
    pub const TEMPERATURE_1: EventMask = EventMask::new(reg::TEMPERATURE_1, 0xFF);
}

/// Default configuration table
///
/// 100 Hz / normal-mode accelerometer at ±2 g, any-motion on all axes and
/// low-g enabled, push-pull active-high interrupt pins latched for 40 ms,
/// any-motion mapped to INT1 and low-g to INT2, filtered data sources.
pub const CONFIG_TABLE: [RegisterWrite; 20] = [
    RegisterWrite::new(reg::ACC_CONF, 0x2B),
    RegisterWrite::new(reg::ACC_RANGE, 0x03),
    RegisterWrite::new(reg::INT_EN_0, 0x07),
    RegisterWrite::new(reg::INT_EN_1, 0x08),
    RegisterWrite::new(reg::INT_EN_2, 0x00),
    RegisterWrite::new(reg::INT_OUT_CTRL, 0xAA),
    RegisterWrite::new(reg::INT_LATCH, 0x0A),
    RegisterWrite::new(reg::INT_MAP_0, 0x04),
    RegisterWrite::new(reg::INT_MAP_1, 0x00),
    RegisterWrite::new(reg::INT_MAP_2, 0x01),
    RegisterWrite::new(reg::INT_DATA_0, 0x80),
    RegisterWrite::new(reg::INT_DATA_1, 0x80),
    RegisterWrite::new(reg::INT_LOWHIGH_0, 0x27),
    RegisterWrite::new(reg::INT_LOWHIGH_1, 0x60),
    RegisterWrite::new(reg::INT_LOWHIGH_2, 0x00),
    RegisterWrite::new(reg::INT_LOWHIGH_3, 0x00),
    RegisterWrite::new(reg::INT_MOTION_0, 0x00),
    RegisterWrite::new(reg::INT_MOTION_1, 0x20),
    RegisterWrite::new(reg::INT_MOTION_2, 0x14),
    RegisterWrite::new(reg::INT_MOTION_3, 0x10),
];

/// Masks the default profile polls, most severe first
pub const DEFAULT_MASKS: [EventMask; 5] = [
    mask::FATAL_ERROR,
    mask::ERROR_CODE,
    mask::DROPPED_COMMAND,
    mask::ANY_MOTION,
    mask::LOW_G,
];

/// Builder preloaded with the default profile, without addresses
pub fn profile() -> SharedConfigurationBuilder {
    SharedConfiguration::builder()
        .entries(&CONFIG_TABLE)
        .masks(&DEFAULT_MASKS)
        .timer_registers(TIMER_REGISTERS)
        .watchdog_threshold(DEFAULT_WATCHDOG_THRESHOLD)
        .commands(COMMANDS)
}

/// Default profile supervising the given sensors
pub fn default_configuration(addresses: &[u8]) -> Result<SharedConfiguration, ConfigError> {
    addresses
        .iter()
        .fold(profile(), |builder, &address| builder.address(address))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_protocol::IMAGE_LEN;

    #[test]
    fn test_table_matches_register_map() {
        assert_eq!(CONFIG_TABLE.len(), 20);
        assert_eq!(CONFIG_TABLE[0], RegisterWrite::new(0x40, 0x2B));
        assert_eq!(CONFIG_TABLE[19], RegisterWrite::new(0x62, 0x10));
    }

    #[test]
    fn test_table_registers_are_distinct() {
        for (i, a) in CONFIG_TABLE.iter().enumerate() {
            for b in &CONFIG_TABLE[i + 1..] {
                assert_ne!(a.register, b.register);
            }
        }
    }

    #[test]
    fn test_default_configuration_both_sensors() {
        let config = default_configuration(&[ADDRESS_PRIMARY, ADDRESS_SECONDARY]).unwrap();
        assert_eq!(config.addresses.as_slice(), &[0x68, 0x69]);
        assert_eq!(config.commands.start, RegisterWrite::new(0x7E, 0x11));
        assert_eq!(config.commands.reboot, RegisterWrite::new(0x7E, 0xB6));
        assert_eq!(config.timer_registers, [0x18, 0x19, 0x1A]);

        let mut image = [0u8; IMAGE_LEN];
        assert!(config.write_image(&mut image).is_ok());
    }

    #[test]
    fn test_default_configuration_needs_a_sensor() {
        assert_eq!(default_configuration(&[]), Err(ConfigError::NoSensors));
    }

    #[test]
    fn test_one_second_of_ticks() {
        assert_eq!(ticks_from_ms(1000), 25_600);
        assert!(DEFAULT_WATCHDOG_THRESHOLD.abs_diff(ticks_from_ms(1000)) < 100);
    }

    #[test]
    fn test_any_motion_reading() {
        assert!(mask::ANY_MOTION.is_tripped_by(0x06));
        assert!(!mask::LOW_G.is_tripped_by(0x04));
    }
}
