//! I2C bus abstractions
//!
//! Provides traits for I2C master operations that can be implemented
//! by chip-specific HALs.

/// Classification of an I2C failure
///
/// Chip HALs report many flavours of bus failure; the watcher only needs to
/// know which of these buckets a failure falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cErrorKind {
    /// Transaction did not finish within the configured cycle budget
    Timeout,
    /// Device did not acknowledge its address or a data byte
    Nack,
    /// Another master won arbitration
    ArbitrationLost,
    /// Any other bus-level failure
    Other,
}

/// Error type of an [`I2cBus`]
pub trait I2cError: core::fmt::Debug {
    /// Classify this error
    fn kind(&self) -> I2cErrorKind;
}

impl I2cError for I2cErrorKind {
    fn kind(&self) -> I2cErrorKind {
        *self
    }
}

/// I2C bus master
///
/// Provides basic I2C read/write operations for communicating with
/// peripheral devices. Every transaction is bounded by a fixed timeout in
/// bus clock cycles; implementations report an expired budget as
/// [`I2cErrorKind::Timeout`] and never retry on their own.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error: I2cError;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Read data from a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `buf` - Buffer to read into
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: I2cBus + ?Sized> I2cBus for &mut T {
    type Error = T::Error;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(address, buf)
    }
}
