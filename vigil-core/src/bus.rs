//! Register-level access to sensors on the I2C bus
//!
//! A register write is the two bytes `[register][value]`. A register read is
//! a one-byte write of the register address followed by a one-byte read.
//! Every transaction is bounded by the bus timeout; a timeout surfaces as
//! [`BusError::Timeout`] and is never retried here.

use vigil_hal::{I2cBus, I2cError};
use vigil_protocol::RegisterWrite;

use crate::error::BusError;

/// Synchronous 8-bit register access over an [`I2cBus`]
pub struct SensorBus<B> {
    bus: B,
}

impl<B: I2cBus> SensorBus<B> {
    /// Wrap an I2C bus
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Write one register
    pub fn write_register(&mut self, address: u8, write: RegisterWrite) -> Result<(), BusError> {
        self.bus
            .write(address, &write.to_bytes())
            .map_err(|e| BusError::from(e.kind()))
    }

    /// Read one register
    pub fn read_register(&mut self, address: u8, register: u8) -> Result<u8, BusError> {
        self.bus
            .write(address, &[register])
            .map_err(|e| BusError::from(e.kind()))?;

        let mut value = [0u8; 1];
        self.bus
            .read(address, &mut value)
            .map_err(|e| BusError::from(e.kind()))?;
        Ok(value[0])
    }

    /// Get a reference to the underlying bus
    pub fn inner(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the underlying bus
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the underlying bus
    pub fn release(self) -> B {
        self.bus
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory register file standing in for sensors on a bus

    use heapless::Vec;
    use vigil_hal::{I2cBus, I2cErrorKind};

    /// One fake device
    pub struct FakeDevice {
        pub address: u8,
        pub registers: [u8; 256],
        /// Register selected by the last one-byte write
        pub pointer: u8,
    }

    /// Register-file bus with scripted failures
    pub struct FakeBus {
        pub devices: Vec<FakeDevice, 2>,
        /// Every write as (address, register, value); reads record `None`
        pub log: Vec<(u8, u8, Option<u8>), 256>,
        /// Fail every transaction to this address
        pub fail_address: Option<(u8, I2cErrorKind)>,
        /// Fail reads of this register
        pub fail_register: Option<(u8, I2cErrorKind)>,
        /// Registers that ignore writes
        pub read_only: Vec<u8, 8>,
    }

    impl FakeBus {
        pub fn new(addresses: &[u8]) -> Self {
            let mut devices = Vec::new();
            for &address in addresses {
                let _ = devices.push(FakeDevice {
                    address,
                    registers: [0; 256],
                    pointer: 0,
                });
            }
            Self {
                devices,
                log: Vec::new(),
                fail_address: None,
                fail_register: None,
                read_only: Vec::new(),
            }
        }

        pub fn device(&mut self, address: u8) -> &mut FakeDevice {
            self.devices
                .iter_mut()
                .find(|d| d.address == address)
                .unwrap()
        }

        pub fn set(&mut self, address: u8, register: u8, value: u8) {
            self.device(address).registers[register as usize] = value;
        }

        pub fn writes_to(&self, address: u8, register: u8, value: u8) -> usize {
            self.log
                .iter()
                .filter(|&&entry| entry == (address, register, Some(value)))
                .count()
        }
    }

    impl I2cBus for FakeBus {
        type Error = I2cErrorKind;

        fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
            if let Some((a, kind)) = self.fail_address {
                if a == address {
                    return Err(kind);
                }
            }
            let read_only = self.read_only.clone();
            let Some(device) = self.devices.iter_mut().find(|d| d.address == address) else {
                return Err(I2cErrorKind::Nack);
            };
            match *data {
                [register] => {
                    device.pointer = register;
                    let _ = self.log.push((address, register, None));
                }
                [register, value] => {
                    if !read_only.contains(&register) {
                        device.registers[register as usize] = value;
                    }
                    let _ = self.log.push((address, register, Some(value)));
                }
                _ => return Err(I2cErrorKind::Other),
            }
            Ok(())
        }

        fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
            if let Some((a, kind)) = self.fail_address {
                if a == address {
                    return Err(kind);
                }
            }
            let fail_register = self.fail_register;
            let Some(device) = self.devices.iter_mut().find(|d| d.address == address) else {
                return Err(I2cErrorKind::Nack);
            };
            if let Some((register, kind)) = fail_register {
                if register == device.pointer {
                    return Err(kind);
                }
            }
            for byte in buf.iter_mut() {
                *byte = device.registers[device.pointer as usize];
                device.pointer = device.pointer.wrapping_add(1);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeBus;
    use super::*;
    use vigil_hal::I2cErrorKind;

    #[test]
    fn test_write_then_read_back() {
        let mut bus = SensorBus::new(FakeBus::new(&[0x69]));
        bus.write_register(0x69, RegisterWrite::new(0x40, 0x2B)).unwrap();
        assert_eq!(bus.read_register(0x69, 0x40), Ok(0x2B));
    }

    #[test]
    fn test_read_selects_register_first() {
        let mut bus = SensorBus::new(FakeBus::new(&[0x69]));
        bus.inner_mut().set(0x69, 0x1C, 0x06);
        assert_eq!(bus.read_register(0x69, 0x1C), Ok(0x06));
        assert_eq!(bus.inner().log.as_slice(), &[(0x69, 0x1C, None)]);
    }

    #[test]
    fn test_absent_device_is_nack() {
        let mut bus = SensorBus::new(FakeBus::new(&[0x69]));
        assert_eq!(bus.read_register(0x68, 0x00), Err(BusError::Nack));
    }

    #[test]
    fn test_timeout_is_classified() {
        let mut fake = FakeBus::new(&[0x69]);
        fake.fail_address = Some((0x69, I2cErrorKind::Timeout));
        let mut bus = SensorBus::new(fake);
        assert_eq!(
            bus.write_register(0x69, RegisterWrite::new(0x7E, 0x11)),
            Err(BusError::Timeout)
        );
    }
}
