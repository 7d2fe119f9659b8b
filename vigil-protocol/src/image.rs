//! Fixed-size image of the controller-written configuration block
//!
//! Image format (all multi-byte fields little-endian):
//! - MAGIC (1 byte): 0x56
//! - VERSION (1 byte): layout version, currently 1
//! - CONFIG COUNT (1 byte) + 32 × (register, value)
//! - ADDRESS COUNT (1 byte) + 2 × address
//! - MASK COUNT (1 byte) + 32 × (register, mask)
//! - TIMER REGISTERS (3 bytes): low, middle, high counter byte
//! - THRESHOLD (4 bytes): watchdog threshold in counter ticks
//! - START COMMAND (2 bytes), REBOOT COMMAND (2 bytes)
//! - CHECKSUM (1 byte): XOR of every preceding byte
//!
//! Unused slots past each count are zero. Every field sits at a fixed offset
//! so the watcher can read it in place, exactly as the controller laid it
//! out.

use heapless::Vec;

use crate::registers::{
    EventMask, RegisterWrite, MAX_CONFIG_ENTRIES, MAX_EVENT_MASKS, MAX_SENSORS,
    TIMER_REGISTER_COUNT,
};

/// Image synchronization byte
pub const IMAGE_MAGIC: u8 = 0x56;

/// Current layout version
pub const IMAGE_VERSION: u8 = 1;

const CONFIG_COUNT_OFFSET: usize = 2;
const CONFIG_OFFSET: usize = CONFIG_COUNT_OFFSET + 1;
const ADDRESS_COUNT_OFFSET: usize = CONFIG_OFFSET + 2 * MAX_CONFIG_ENTRIES;
const ADDRESS_OFFSET: usize = ADDRESS_COUNT_OFFSET + 1;
const MASK_COUNT_OFFSET: usize = ADDRESS_OFFSET + MAX_SENSORS;
const MASK_OFFSET: usize = MASK_COUNT_OFFSET + 1;
const TIMER_OFFSET: usize = MASK_OFFSET + 2 * MAX_EVENT_MASKS;
const THRESHOLD_OFFSET: usize = TIMER_OFFSET + TIMER_REGISTER_COUNT;
const START_OFFSET: usize = THRESHOLD_OFFSET + 4;
const REBOOT_OFFSET: usize = START_OFFSET + 2;
const CHECKSUM_OFFSET: usize = REBOOT_OFFSET + 2;

/// Total image size in bytes
pub const IMAGE_LEN: usize = CHECKSUM_OFFSET + 1;

/// Errors that can occur while encoding or decoding an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ImageError {
    /// Buffer shorter than [`IMAGE_LEN`]
    BufferTooSmall,
    /// First byte is not [`IMAGE_MAGIC`]
    BadMagic,
    /// Layout version this build does not understand
    UnsupportedVersion(u8),
    /// A count field exceeds its fixed capacity
    CountOutOfRange,
    /// Checksum mismatch
    InvalidChecksum,
}

impl core::fmt::Display for ImageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer shorter than {IMAGE_LEN} bytes"),
            Self::BadMagic => write!(f, "missing image magic"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported image version {v}"),
            Self::CountOutOfRange => write!(f, "count field exceeds capacity"),
            Self::InvalidChecksum => write!(f, "image checksum mismatch"),
        }
    }
}

impl core::error::Error for ImageError {}

/// Borrowed view of everything that goes into an image
#[derive(Debug, Clone, Copy)]
pub struct ImageFields<'a> {
    /// Configuration table, in programming order
    pub config: &'a [RegisterWrite],
    /// Sensor bus addresses
    pub addresses: &'a [u8],
    /// Event masks, in polling order
    pub masks: &'a [EventMask],
    /// Counter registers, least significant byte first
    pub timer_registers: [u8; TIMER_REGISTER_COUNT],
    /// Watchdog threshold in counter ticks
    pub threshold: u32,
    /// Device start command
    pub start_command: RegisterWrite,
    /// Device reset command
    pub reboot_command: RegisterWrite,
}

/// Owned contents of a decoded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Configuration table, in programming order
    pub config: Vec<RegisterWrite, MAX_CONFIG_ENTRIES>,
    /// Sensor bus addresses
    pub addresses: Vec<u8, MAX_SENSORS>,
    /// Event masks, in polling order
    pub masks: Vec<EventMask, MAX_EVENT_MASKS>,
    /// Counter registers, least significant byte first
    pub timer_registers: [u8; TIMER_REGISTER_COUNT],
    /// Watchdog threshold in counter ticks
    pub threshold: u32,
    /// Device start command
    pub start_command: RegisterWrite,
    /// Device reset command
    pub reboot_command: RegisterWrite,
}

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &b| acc ^ b)
}

/// Encode an image into `buffer`
///
/// Returns the number of bytes written (always [`IMAGE_LEN`]).
pub fn encode_image(fields: &ImageFields<'_>, buffer: &mut [u8]) -> Result<usize, ImageError> {
    if buffer.len() < IMAGE_LEN {
        return Err(ImageError::BufferTooSmall);
    }
    if fields.config.len() > MAX_CONFIG_ENTRIES
        || fields.addresses.len() > MAX_SENSORS
        || fields.masks.len() > MAX_EVENT_MASKS
    {
        return Err(ImageError::CountOutOfRange);
    }

    let image = &mut buffer[..IMAGE_LEN];
    image.fill(0);

    image[0] = IMAGE_MAGIC;
    image[1] = IMAGE_VERSION;

    image[CONFIG_COUNT_OFFSET] = fields.config.len() as u8;
    for (slot, entry) in image[CONFIG_OFFSET..ADDRESS_COUNT_OFFSET]
        .chunks_exact_mut(2)
        .zip(fields.config)
    {
        slot.copy_from_slice(&entry.to_bytes());
    }

    image[ADDRESS_COUNT_OFFSET] = fields.addresses.len() as u8;
    image[ADDRESS_OFFSET..ADDRESS_OFFSET + fields.addresses.len()]
        .copy_from_slice(fields.addresses);

    image[MASK_COUNT_OFFSET] = fields.masks.len() as u8;
    for (slot, mask) in image[MASK_OFFSET..TIMER_OFFSET]
        .chunks_exact_mut(2)
        .zip(fields.masks)
    {
        slot[0] = mask.register;
        slot[1] = mask.mask;
    }

    image[TIMER_OFFSET..THRESHOLD_OFFSET].copy_from_slice(&fields.timer_registers);
    image[THRESHOLD_OFFSET..START_OFFSET].copy_from_slice(&fields.threshold.to_le_bytes());
    image[START_OFFSET..REBOOT_OFFSET].copy_from_slice(&fields.start_command.to_bytes());
    image[REBOOT_OFFSET..CHECKSUM_OFFSET].copy_from_slice(&fields.reboot_command.to_bytes());

    image[CHECKSUM_OFFSET] = checksum(&image[..CHECKSUM_OFFSET]);

    Ok(IMAGE_LEN)
}

/// Decode an image previously written by [`encode_image`]
///
/// Checks framing only; whether the configuration is complete enough to
/// release the watcher is decided by the caller.
pub fn decode_image(buffer: &[u8]) -> Result<DecodedImage, ImageError> {
    if buffer.len() < IMAGE_LEN {
        return Err(ImageError::BufferTooSmall);
    }
    let image = &buffer[..IMAGE_LEN];

    if image[0] != IMAGE_MAGIC {
        return Err(ImageError::BadMagic);
    }
    if image[1] != IMAGE_VERSION {
        return Err(ImageError::UnsupportedVersion(image[1]));
    }
    if image[CHECKSUM_OFFSET] != checksum(&image[..CHECKSUM_OFFSET]) {
        return Err(ImageError::InvalidChecksum);
    }

    let config_count = image[CONFIG_COUNT_OFFSET] as usize;
    let address_count = image[ADDRESS_COUNT_OFFSET] as usize;
    let mask_count = image[MASK_COUNT_OFFSET] as usize;
    if config_count > MAX_CONFIG_ENTRIES
        || address_count > MAX_SENSORS
        || mask_count > MAX_EVENT_MASKS
    {
        return Err(ImageError::CountOutOfRange);
    }

    let mut config = Vec::new();
    for pair in image[CONFIG_OFFSET..ADDRESS_COUNT_OFFSET]
        .chunks_exact(2)
        .take(config_count)
    {
        config
            .push(RegisterWrite::new(pair[0], pair[1]))
            .map_err(|_| ImageError::CountOutOfRange)?;
    }

    let mut addresses = Vec::new();
    addresses
        .extend_from_slice(&image[ADDRESS_OFFSET..ADDRESS_OFFSET + address_count])
        .map_err(|_| ImageError::CountOutOfRange)?;

    let mut masks = Vec::new();
    for pair in image[MASK_OFFSET..TIMER_OFFSET]
        .chunks_exact(2)
        .take(mask_count)
    {
        masks
            .push(EventMask::new(pair[0], pair[1]))
            .map_err(|_| ImageError::CountOutOfRange)?;
    }

    let timer_registers = [
        image[TIMER_OFFSET],
        image[TIMER_OFFSET + 1],
        image[TIMER_OFFSET + 2],
    ];
    let threshold = u32::from_le_bytes([
        image[THRESHOLD_OFFSET],
        image[THRESHOLD_OFFSET + 1],
        image[THRESHOLD_OFFSET + 2],
        image[THRESHOLD_OFFSET + 3],
    ]);

    Ok(DecodedImage {
        config,
        addresses,
        masks,
        timer_registers,
        threshold,
        start_command: RegisterWrite::new(image[START_OFFSET], image[START_OFFSET + 1]),
        reboot_command: RegisterWrite::new(image[REBOOT_OFFSET], image[REBOOT_OFFSET + 1]),
    })
}
