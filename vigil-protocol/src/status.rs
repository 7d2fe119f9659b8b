//! Report encoding
//!
//! A report is three words the watcher writes before raising DRIVE:
//!
//! - `status`: `-1` normal, `-2` watchdog check-in, `-3` bus error, or a
//!   non-negative index into the event mask list for a tripped mask
//! - `address`: index into the sensor address list of the device involved
//! - `error`: raw bus error code, [`error_code::NONE`] unless `status == -3`

/// Status word for "nothing to report"
pub const STATUS_NORMAL: i32 = -1;

/// Status word for a watchdog check-in
pub const STATUS_WATCHDOG_CHECKIN: i32 = -2;

/// Status word for a bus error
pub const STATUS_BUS_ERROR: i32 = -3;

/// Raw error codes carried in the `error` word
pub mod error_code {
    /// No error
    pub const NONE: i32 = 0;
    /// Generic failure (no acknowledge, bus fault)
    pub const FAIL: i32 = -1;
    /// Shared configuration unusable
    pub const INVALID_ARG: i32 = 0x102;
    /// Bus lost to another master
    pub const INVALID_STATE: i32 = 0x103;
    /// Transaction timed out
    pub const TIMEOUT: i32 = 0x107;
    /// Device answered with something other than what was written
    pub const INVALID_RESPONSE: i32 = 0x108;
}

/// Decoded status word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusCode {
    /// Nothing to report
    Normal,
    /// Liveness beat from the watchdog path
    WatchdogCheckin,
    /// Bus failure; see the error word
    BusError,
    /// Event mask at this index tripped
    MaskTripped(u8),
}

/// Errors decoding a status word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusError {
    /// Negative word that is not one of the sentinels
    UnknownSentinel(i32),
    /// Mask index beyond the mask list capacity
    MaskIndexOutOfRange(i32),
    /// Address index beyond the sensor list capacity
    AddressIndexOutOfRange(u32),
}

impl core::fmt::Display for StatusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownSentinel(word) => write!(f, "unknown status sentinel {word}"),
            Self::MaskIndexOutOfRange(word) => write!(f, "mask index {word} out of range"),
            Self::AddressIndexOutOfRange(word) => write!(f, "address index {word} out of range"),
        }
    }
}

impl core::error::Error for StatusError {}

impl StatusCode {
    /// Encode as the shared status word
    pub const fn to_word(self) -> i32 {
        match self {
            Self::Normal => STATUS_NORMAL,
            Self::WatchdogCheckin => STATUS_WATCHDOG_CHECKIN,
            Self::BusError => STATUS_BUS_ERROR,
            Self::MaskTripped(index) => index as i32,
        }
    }

    /// Decode a shared status word
    pub fn from_word(word: i32) -> Result<Self, StatusError> {
        match word {
            STATUS_NORMAL => Ok(Self::Normal),
            STATUS_WATCHDOG_CHECKIN => Ok(Self::WatchdogCheckin),
            STATUS_BUS_ERROR => Ok(Self::BusError),
            w if w < 0 => Err(StatusError::UnknownSentinel(w)),
            w if w < crate::MAX_EVENT_MASKS as i32 => Ok(Self::MaskTripped(w as u8)),
            w => Err(StatusError::MaskIndexOutOfRange(w)),
        }
    }
}

/// The watcher-written report tuple, as it sits in shared memory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusFields {
    /// Status word
    pub status: i32,
    /// Sensor address index
    pub address: u32,
    /// Raw error code
    pub error: i32,
}

impl StatusFields {
    /// Fields of an empty report slot
    pub const IDLE: Self = Self {
        status: STATUS_NORMAL,
        address: 0,
        error: error_code::NONE,
    };

    /// Decoded status word
    pub fn code(&self) -> Result<StatusCode, StatusError> {
        StatusCode::from_word(self.status)
    }

    /// Decoded address word
    pub fn address_index(&self) -> Result<u8, StatusError> {
        if self.address < crate::MAX_SENSORS as u32 {
            Ok(self.address as u8)
        } else {
            Err(StatusError::AddressIndexOutOfRange(self.address))
        }
    }
}

impl Default for StatusFields {
    fn default() -> Self {
        Self::IDLE
    }
}
