//! Report carried through the handshake

use vigil_protocol::{error_code, StatusCode, StatusError, StatusFields};

/// What the watcher is reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Status {
    /// Nothing to report
    Normal,
    /// Watchdog interval elapsed
    WatchdogCheckin,
    /// Event mask at this index tripped
    Fault {
        /// Index into the event mask list
        mask_index: u8,
    },
    /// Bus failure with its wire error code
    BusError {
        /// Raw error code
        code: i32,
    },
}

/// One report from watcher to controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandshakeMessage {
    /// What happened
    pub status: Status,
    /// Index into the sensor address list of the device involved
    pub address_index: u8,
}

impl HandshakeMessage {
    /// Empty report
    pub const NORMAL: Self = Self {
        status: Status::Normal,
        address_index: 0,
    };

    /// Tripped mask on a sensor
    pub const fn fault(address_index: u8, mask_index: u8) -> Self {
        Self {
            status: Status::Fault { mask_index },
            address_index,
        }
    }

    /// Watchdog liveness beat
    pub const fn checkin() -> Self {
        Self {
            status: Status::WatchdogCheckin,
            address_index: 0,
        }
    }

    /// Bus failure on a sensor
    pub const fn bus_error(address_index: u8, code: i32) -> Self {
        Self {
            status: Status::BusError { code },
            address_index,
        }
    }

    /// Error code; [`error_code::NONE`] unless this is a bus error
    pub const fn error_code(&self) -> i32 {
        match self.status {
            Status::BusError { code } => code,
            _ => error_code::NONE,
        }
    }

    /// Encode as the shared report words
    pub const fn to_fields(&self) -> StatusFields {
        let code = match self.status {
            Status::Normal => StatusCode::Normal,
            Status::WatchdogCheckin => StatusCode::WatchdogCheckin,
            Status::Fault { mask_index } => StatusCode::MaskTripped(mask_index),
            Status::BusError { .. } => StatusCode::BusError,
        };
        StatusFields {
            status: code.to_word(),
            address: self.address_index as u32,
            error: self.error_code(),
        }
    }

    /// Decode the shared report words
    pub fn from_fields(fields: StatusFields) -> Result<Self, StatusError> {
        let status = match fields.code()? {
            StatusCode::Normal => Status::Normal,
            StatusCode::WatchdogCheckin => Status::WatchdogCheckin,
            StatusCode::MaskTripped(mask_index) => Status::Fault { mask_index },
            StatusCode::BusError => Status::BusError {
                code: fields.error,
            },
        };
        Ok(Self {
            status,
            address_index: fields.address_index()?,
        })
    }
}

impl Default for HandshakeMessage {
    fn default() -> Self {
        Self::NORMAL
    }
}
