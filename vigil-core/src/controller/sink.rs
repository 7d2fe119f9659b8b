//! Reports as the controller sees them, and where they go

use crate::handshake::{HandshakeMessage, Status};

/// Interpreted watcher report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Report {
    /// Empty report
    Normal,
    /// Watchdog liveness beat
    Checkin,
    /// Event mask tripped on a sensor
    SensorFault {
        /// Index into the sensor address list
        address_index: u8,
        /// Index into the event mask list
        mask_index: u8,
    },
    /// The watcher hit a fatal bus error and halted
    WatcherHalted {
        /// Index into the sensor address list
        address_index: u8,
        /// Raw error code
        error_code: i32,
    },
}

impl From<HandshakeMessage> for Report {
    fn from(message: HandshakeMessage) -> Self {
        match message.status {
            Status::Normal => Self::Normal,
            Status::WatchdogCheckin => Self::Checkin,
            Status::Fault { mask_index } => Self::SensorFault {
                address_index: message.address_index,
                mask_index,
            },
            Status::BusError { code } => Self::WatcherHalted {
                address_index: message.address_index,
                error_code: code,
            },
        }
    }
}

/// Application callbacks for watcher reports
///
/// Implemented by whatever owns the device's user-visible state (attribute
/// model, indicator LED, ...).
pub trait StatusSink {
    /// Called for every report before the specific callback
    fn status_update(&mut self, report: &Report) {
        let _ = report;
    }

    /// A sensor event mask tripped
    fn sensor_fault(&mut self, address_index: u8, mask_index: u8);

    /// The watcher checked in
    fn checkin(&mut self) {}

    /// The watcher reported a fatal bus error and halted
    fn watcher_halted(&mut self, address_index: u8, error_code: i32);

    /// The restart budget is spent; the device stays degraded but safe
    fn degraded(&mut self) {}
}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn status_update(&mut self, report: &Report) {
        (**self).status_update(report)
    }

    fn sensor_fault(&mut self, address_index: u8, mask_index: u8) {
        (**self).sensor_fault(address_index, mask_index)
    }

    fn checkin(&mut self) {
        (**self).checkin()
    }

    fn watcher_halted(&mut self, address_index: u8, error_code: i32) {
        (**self).watcher_halted(address_index, error_code)
    }

    fn degraded(&mut self) {
        (**self).degraded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_report() {
        assert_eq!(
            Report::from(HandshakeMessage::fault(1, 5)),
            Report::SensorFault {
                address_index: 1,
                mask_index: 5
            }
        );
    }

    #[test]
    fn test_bus_error_means_halted() {
        assert_eq!(
            Report::from(HandshakeMessage::bus_error(0, 0x107)),
            Report::WatcherHalted {
                address_index: 0,
                error_code: 0x107
            }
        );
    }
}
