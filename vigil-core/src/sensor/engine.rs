//! Sensor configuration engine
//!
//! Programs the configuration table into one sensor, reads it back, and runs
//! the full reset / configure / validate / start sequence.

use vigil_hal::{DelayCycles, I2cBus};
use vigil_protocol::RegisterWrite;

use crate::bus::SensorBus;
use crate::config::DeviceCommands;
use crate::error::{BringUpError, BringUpStage, BusError, RegisterMismatch, ValidateError};

/// How far bring-up got for one sensor address
///
/// Derived from the outcome of the last bring-up; nothing here survives a
/// watcher restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Not attempted, or the reset command failed
    #[default]
    Unknown,
    /// Reset accepted, table not fully written
    Reset,
    /// Table written, read-back failed or differed
    Configured,
    /// Table verified, start command failed
    Validated,
    /// Started and supervised
    Running,
}

impl DeviceState {
    /// State left behind by a bring-up attempt
    pub const fn after(outcome: &Result<(), BringUpError>) -> Self {
        match outcome {
            Ok(()) => Self::Running,
            Err(BringUpError::Bus { stage, .. }) => match stage {
                BringUpStage::Reset => Self::Unknown,
                BringUpStage::Configure => Self::Reset,
                BringUpStage::Validate => Self::Configured,
                BringUpStage::Start => Self::Validated,
            },
            Err(BringUpError::Mismatch(_)) => Self::Configured,
        }
    }

    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Programs and verifies the configuration table
#[derive(Debug, Clone, Copy)]
pub struct SensorConfigEngine<'a> {
    table: &'a [RegisterWrite],
    commands: DeviceCommands,
    settle_cycles: u32,
}

impl<'a> SensorConfigEngine<'a> {
    /// Create an engine for a table and command pair
    ///
    /// `settle_cycles` is the pause between the reset command and the first
    /// configuration write.
    pub fn new(table: &'a [RegisterWrite], commands: DeviceCommands, settle_cycles: u32) -> Self {
        Self {
            table,
            commands,
            settle_cycles,
        }
    }

    /// Write every table entry in order, stopping at the first failure
    pub fn configure<B: I2cBus>(
        &self,
        bus: &mut SensorBus<B>,
        address: u8,
    ) -> Result<(), BusError> {
        for entry in self.table {
            bus.write_register(address, *entry)?;
        }
        Ok(())
    }

    /// Read every table register back in order
    ///
    /// Fails at the first register whose value differs from the table.
    pub fn validate<B: I2cBus>(
        &self,
        bus: &mut SensorBus<B>,
        address: u8,
    ) -> Result<(), ValidateError> {
        for (index, entry) in self.table.iter().enumerate() {
            let actual = bus.read_register(address, entry.register)?;
            if actual != entry.value {
                return Err(ValidateError::Mismatch(RegisterMismatch {
                    index: index as u8,
                    register: entry.register,
                    expected: entry.value,
                    actual,
                }));
            }
        }
        Ok(())
    }

    /// Reset, configure, validate and start one sensor
    pub fn bring_up<B: I2cBus, D: DelayCycles>(
        &self,
        bus: &mut SensorBus<B>,
        delay: &mut D,
        address: u8,
    ) -> Result<(), BringUpError> {
        debug!("bring-up {=u8:#x}: reset", address);
        bus.write_register(address, self.commands.reboot)
            .map_err(|error| BringUpError::Bus {
                stage: BringUpStage::Reset,
                error,
            })?;

        delay.delay_cycles(self.settle_cycles);

        self.configure(bus, address)
            .map_err(|error| BringUpError::Bus {
                stage: BringUpStage::Configure,
                error,
            })?;

        self.validate(bus, address)?;

        bus.write_register(address, self.commands.start)
            .map_err(|error| BringUpError::Bus {
                stage: BringUpStage::Start,
                error,
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::testing::FakeBus;
    use vigil_hal::{I2cErrorKind, NoDelay};

    const TABLE: [RegisterWrite; 3] = [
        RegisterWrite::new(0x40, 0x2B),
        RegisterWrite::new(0x41, 0x03),
        RegisterWrite::new(0x52, 0x00),
    ];

    fn engine() -> SensorConfigEngine<'static> {
        SensorConfigEngine::new(&TABLE, DeviceCommands::default(), 0)
    }

    #[test]
    fn test_configure_writes_in_table_order() {
        let mut bus = SensorBus::new(FakeBus::new(&[0x69]));
        engine().configure(&mut bus, 0x69).unwrap();

        let log = &bus.inner().log;
        assert_eq!(log.len(), 3);
        assert_eq!(log[0], (0x69, 0x40, Some(0x2B)));
        assert_eq!(log[1], (0x69, 0x41, Some(0x03)));
        assert_eq!(log[2], (0x69, 0x52, Some(0x00)));
    }

    #[test]
    fn test_configure_stops_at_first_failure() {
        let mut fake = FakeBus::new(&[0x69]);
        fake.fail_address = Some((0x69, I2cErrorKind::Nack));
        let mut bus = SensorBus::new(fake);
        assert_eq!(engine().configure(&mut bus, 0x69), Err(BusError::Nack));
        assert!(bus.inner().log.is_empty());
    }

    #[test]
    fn test_validate_reports_first_mismatch() {
        let mut bus = SensorBus::new(FakeBus::new(&[0x69]));
        engine().configure(&mut bus, 0x69).unwrap();
        bus.inner_mut().set(0x69, 0x41, 0x07);
        bus.inner_mut().set(0x69, 0x52, 0x01);

        assert_eq!(
            engine().validate(&mut bus, 0x69),
            Err(ValidateError::Mismatch(RegisterMismatch {
                index: 1,
                register: 0x41,
                expected: 0x03,
                actual: 0x07,
            }))
        );
    }

    #[test]
    fn test_validate_bus_error() {
        let mut fake = FakeBus::new(&[0x69]);
        fake.fail_register = Some((0x41, I2cErrorKind::Timeout));
        let mut bus = SensorBus::new(fake);
        engine().configure(&mut bus, 0x69).unwrap();
        assert_eq!(
            engine().validate(&mut bus, 0x69),
            Err(ValidateError::Bus(BusError::Timeout))
        );
    }

    #[test]
    fn test_bring_up_sequence() {
        let mut bus = SensorBus::new(FakeBus::new(&[0x69]));
        engine().bring_up(&mut bus, &mut NoDelay, 0x69).unwrap();

        let fake = bus.inner();
        assert_eq!(fake.log.first(), Some(&(0x69, 0x7E, Some(0xB6))));
        assert_eq!(fake.log.last(), Some(&(0x69, 0x7E, Some(0x11))));
        assert_eq!(fake.writes_to(0x69, 0x7E, 0x11), 1);
    }

    #[test]
    fn test_bring_up_mismatch_skips_start() {
        let mut fake = FakeBus::new(&[0x69]);
        let _ = fake.read_only.push(0x41);
        let mut bus = SensorBus::new(fake);

        let result = engine().bring_up(&mut bus, &mut NoDelay, 0x69);
        assert!(matches!(result, Err(BringUpError::Mismatch(m)) if m.register == 0x41));
        assert_eq!(bus.inner().writes_to(0x69, 0x7E, 0x11), 0);
    }

    #[test]
    fn test_bring_up_reset_failure_is_tagged() {
        let mut fake = FakeBus::new(&[0x69]);
        fake.fail_address = Some((0x69, I2cErrorKind::Timeout));
        let mut bus = SensorBus::new(fake);

        assert_eq!(
            engine().bring_up(&mut bus, &mut NoDelay, 0x69),
            Err(BringUpError::Bus {
                stage: BringUpStage::Reset,
                error: BusError::Timeout,
            })
        );
    }

    #[test]
    fn test_device_state_follows_failing_stage() {
        let mut fake = FakeBus::new(&[0x69]);
        let _ = fake.read_only.push(0x41);
        let mut bus = SensorBus::new(fake);
        let outcome = engine().bring_up(&mut bus, &mut NoDelay, 0x69);
        assert_eq!(DeviceState::after(&outcome), DeviceState::Configured);

        let mut bus = SensorBus::new(FakeBus::new(&[0x69]));
        let outcome = engine().bring_up(&mut bus, &mut NoDelay, 0x69);
        assert!(DeviceState::after(&outcome).is_running());

        let mut bus = SensorBus::new(FakeBus::new(&[0x68]));
        let outcome = engine().bring_up(&mut bus, &mut NoDelay, 0x69);
        assert_eq!(DeviceState::after(&outcome), DeviceState::Unknown);
    }
}
