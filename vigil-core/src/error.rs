//! Error types shared by the watcher components
//!
//! Bus failures are classified once, at the [`SensorBus`](crate::SensorBus)
//! boundary, and carried unchanged up to the handshake where they become a
//! wire error code.

use vigil_hal::I2cErrorKind;
use vigil_protocol::error_code;

/// Register transaction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Transaction exceeded its cycle budget
    Timeout,
    /// Device did not acknowledge
    Nack,
    /// Another master took the bus
    ArbitrationLost,
    /// Any other bus failure
    Other,
}

impl From<I2cErrorKind> for BusError {
    fn from(kind: I2cErrorKind) -> Self {
        match kind {
            I2cErrorKind::Timeout => Self::Timeout,
            I2cErrorKind::Nack => Self::Nack,
            I2cErrorKind::ArbitrationLost => Self::ArbitrationLost,
            I2cErrorKind::Other => Self::Other,
        }
    }
}

impl BusError {
    /// Error code reported to the controller
    pub const fn code(self) -> i32 {
        match self {
            Self::Timeout => error_code::TIMEOUT,
            Self::Nack | Self::Other => error_code::FAIL,
            Self::ArbitrationLost => error_code::INVALID_STATE,
        }
    }

    /// Classification of this failure
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::Timeout => ErrorKind::BusTimeout,
            Self::Nack => ErrorKind::BusNack,
            Self::ArbitrationLost | Self::Other => ErrorKind::BusFault,
        }
    }
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Timeout => write!(f, "bus transaction timed out"),
            Self::Nack => write!(f, "device did not acknowledge"),
            Self::ArbitrationLost => write!(f, "bus arbitration lost"),
            Self::Other => write!(f, "bus fault"),
        }
    }
}

impl core::error::Error for BusError {}

/// A register read back a different value than was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMismatch {
    /// Position of the entry in the configuration table
    pub index: u8,
    /// Register address
    pub register: u8,
    /// Value written during configuration
    pub expected: u8,
    /// Value read back
    pub actual: u8,
}

impl core::fmt::Display for RegisterMismatch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "register 0x{:02X} (entry {}) read 0x{:02X}, expected 0x{:02X}",
            self.register, self.index, self.actual, self.expected
        )
    }
}

impl core::error::Error for RegisterMismatch {}

/// Failure of read-back validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidateError {
    /// Communication failed before every register was checked
    Bus(BusError),
    /// First register whose read-back differs
    Mismatch(RegisterMismatch),
}

impl From<BusError> for ValidateError {
    fn from(err: BusError) -> Self {
        Self::Bus(err)
    }
}

impl core::fmt::Display for ValidateError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(err) => write!(f, "validation aborted: {err}"),
            Self::Mismatch(mismatch) => write!(f, "validation failed: {mismatch}"),
        }
    }
}

impl core::error::Error for ValidateError {}

/// Step of the bring-up sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpStage {
    /// Device reset command
    Reset,
    /// Writing the configuration table
    Configure,
    /// Reading the configuration table back
    Validate,
    /// Device start command
    Start,
}

/// Bring-up failure for one sensor address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringUpError {
    /// Bus failure during the given stage
    Bus {
        /// Stage that failed
        stage: BringUpStage,
        /// Underlying failure
        error: BusError,
    },
    /// Read-back did not match the table
    Mismatch(RegisterMismatch),
}

impl BringUpError {
    /// Error code reported to the controller
    pub const fn code(self) -> i32 {
        match self {
            Self::Bus { error, .. } => error.code(),
            Self::Mismatch(_) => error_code::INVALID_RESPONSE,
        }
    }

    /// Classification of this failure
    pub const fn kind(self) -> ErrorKind {
        match self {
            Self::Bus { error, .. } => error.kind(),
            Self::Mismatch(_) => ErrorKind::RegisterMismatch,
        }
    }
}

impl From<ValidateError> for BringUpError {
    fn from(err: ValidateError) -> Self {
        match err {
            ValidateError::Bus(error) => Self::Bus {
                stage: BringUpStage::Validate,
                error,
            },
            ValidateError::Mismatch(mismatch) => Self::Mismatch(mismatch),
        }
    }
}

impl core::fmt::Display for BringUpError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus { stage, error } => write!(f, "bring-up {stage:?} failed: {error}"),
            Self::Mismatch(mismatch) => write!(f, "bring-up validation failed: {mismatch}"),
        }
    }
}

impl core::error::Error for BringUpError {}

/// Classification of everything the watcher can observe going wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ErrorKind {
    /// Bus transaction timed out
    BusTimeout,
    /// Device did not acknowledge
    BusNack,
    /// Arbitration loss or other bus-level fault
    BusFault,
    /// Configuration read-back differed
    RegisterMismatch,
    /// An event mask is asserted
    MaskTripped,
    /// Watchdog counter advanced past the threshold
    WatchdogOverdue,
}
