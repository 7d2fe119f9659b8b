//! Event mask poller
//!
//! Scans every (register, mask) pair on every sensor, address-major, and
//! reports the first one that reads non-zero under its mask.

use vigil_hal::I2cBus;
use vigil_protocol::EventMask;

use crate::bus::SensorBus;

/// A tripped event mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trip {
    /// Index into the sensor address list
    pub address_index: u8,
    /// Index into the event mask list
    pub mask_index: u8,
}

/// Polls event masks across all sensors
#[derive(Debug, Clone, Copy)]
pub struct EventPoller<'a> {
    addresses: &'a [u8],
    masks: &'a [EventMask],
}

impl<'a> EventPoller<'a> {
    /// Create a poller over the given sensors and masks
    pub fn new(addresses: &'a [u8], masks: &'a [EventMask]) -> Self {
        Self { addresses, masks }
    }

    /// Scan once and return the first tripped mask
    ///
    /// A register that cannot be read counts as not tripped for this scan.
    pub fn poll<B: I2cBus>(&self, bus: &mut SensorBus<B>) -> Option<Trip> {
        for (address_index, &address) in self.addresses.iter().enumerate() {
            for (mask_index, mask) in self.masks.iter().enumerate() {
                match bus.read_register(address, mask.register) {
                    Ok(reading) if mask.is_tripped_by(reading) => {
                        return Some(Trip {
                            address_index: address_index as u8,
                            mask_index: mask_index as u8,
                        });
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!(
                            "poll {=u8:#x} reg {=u8:#x}: {}",
                            address,
                            mask.register,
                            err
                        );
                    }
                }
            }
        }
        None
    }
}
