//! Host-side stand-ins for the sensor bus, delays and handshake probes

#![allow(dead_code)]

use std::sync::Mutex;

use vigil_core::handshake::{Mailbox, Phase};
use vigil_hal::{DelayCycles, I2cBus, I2cErrorKind, LevelLine, OutputPin};

struct Device {
    address: u8,
    registers: [u8; 256],
    pointer: u8,
    writes: Vec<(u8, u8)>,
    read_only: Vec<u8>,
    failure: Option<I2cErrorKind>,
}

/// Register files for every sensor on a simulated bus
///
/// Shared between the thread running the watcher and the test body.
pub struct SensorFarm {
    devices: Mutex<Vec<Device>>,
}

impl SensorFarm {
    pub fn new(addresses: &[u8]) -> Self {
        let devices = addresses
            .iter()
            .map(|&address| Device {
                address,
                registers: [0; 256],
                pointer: 0,
                writes: Vec::new(),
                read_only: Vec::new(),
                failure: None,
            })
            .collect();
        Self {
            devices: Mutex::new(devices),
        }
    }

    fn with<R>(&self, address: u8, f: impl FnOnce(&mut Device) -> R) -> Option<R> {
        let mut devices = self.devices.lock().unwrap();
        devices.iter_mut().find(|d| d.address == address).map(f)
    }

    pub fn set(&self, address: u8, register: u8, value: u8) {
        self.with(address, |d| d.registers[register as usize] = value);
    }

    pub fn get(&self, address: u8, register: u8) -> u8 {
        self.with(address, |d| d.registers[register as usize])
            .unwrap_or(0)
    }

    pub fn set_counter(&self, address: u8, registers: [u8; 3], value: u32) {
        let bytes = value.to_le_bytes();
        for (register, byte) in registers.iter().zip(bytes) {
            self.set(address, *register, byte);
        }
    }

    pub fn make_read_only(&self, address: u8, register: u8) {
        self.with(address, |d| d.read_only.push(register));
    }

    pub fn make_writable(&self, address: u8) {
        self.with(address, |d| d.read_only.clear());
    }

    pub fn fail(&self, address: u8, failure: Option<I2cErrorKind>) {
        self.with(address, |d| d.failure = failure);
    }

    pub fn writes(&self, address: u8) -> Vec<(u8, u8)> {
        self.with(address, |d| d.writes.clone()).unwrap_or_default()
    }

    pub fn count_writes(&self, address: u8, register: u8, value: u8) -> usize {
        self.writes(address)
            .iter()
            .filter(|&&w| w == (register, value))
            .count()
    }

    pub fn bus(&self) -> SimBus<'_> {
        SimBus { farm: self }
    }
}

/// I2C master onto a [`SensorFarm`]
pub struct SimBus<'f> {
    farm: &'f SensorFarm,
}

impl I2cBus for SimBus<'_> {
    type Error = I2cErrorKind;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.farm
            .with(address, |d| {
                if let Some(kind) = d.failure {
                    return Err(kind);
                }
                match *data {
                    [register] => d.pointer = register,
                    [register, value] => {
                        d.writes.push((register, value));
                        if !d.read_only.contains(&register) {
                            d.registers[register as usize] = value;
                        }
                    }
                    _ => return Err(I2cErrorKind::Other),
                }
                Ok(())
            })
            .unwrap_or(Err(I2cErrorKind::Nack))
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.farm
            .with(address, |d| {
                if let Some(kind) = d.failure {
                    return Err(kind);
                }
                for byte in buf.iter_mut() {
                    *byte = d.registers[d.pointer as usize];
                    d.pointer = d.pointer.wrapping_add(1);
                }
                Ok(())
            })
            .unwrap_or(Err(I2cErrorKind::Nack))
    }
}

/// Delay that gives the other thread a chance to run
pub struct YieldDelay;

impl DelayCycles for YieldDelay {
    fn delay_cycles(&mut self, _cycles: u32) {
        std::thread::yield_now();
    }
}

/// Which line an edge was driven on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Drive,
    Driven,
}

/// Edge log shared by both ends of the handshake
pub type EdgeLog = Mutex<Vec<(Line, bool, Phase)>>;

/// Output pin that records the mailbox phase at every edge it drives
///
/// The phase is read before the level changes, so it is the phase the
/// driving side was in when it decided to move the line.
pub struct ProbedPin<'a> {
    pub line: &'a LevelLine,
    pub name: Line,
    pub mailbox: &'a Mailbox,
    pub log: &'a EdgeLog,
}

impl OutputPin for ProbedPin<'_> {
    fn set_high(&mut self) {
        self.log
            .lock()
            .unwrap()
            .push((self.name, true, self.mailbox.phase()));
        self.line.drive(true);
    }

    fn set_low(&mut self) {
        self.log
            .lock()
            .unwrap()
            .push((self.name, false, self.mailbox.phase()));
        self.line.drive(false);
    }

    fn is_set_high(&self) -> bool {
        self.line.level()
    }
}
