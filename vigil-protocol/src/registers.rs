//! Register-level building blocks of the shared configuration

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum (register, value) pairs in the configuration table
pub const MAX_CONFIG_ENTRIES: usize = 32;

/// Maximum sensor devices on the bus
pub const MAX_SENSORS: usize = 2;

/// Maximum (register, mask) pairs the watcher polls
pub const MAX_EVENT_MASKS: usize = 32;

/// Registers that together form the sensor's free-running counter
pub const TIMER_REGISTER_COUNT: usize = 3;

/// A value to program into one 8-bit register
///
/// Also used for device commands, which are plain register writes with a
/// fixed opcode value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegisterWrite {
    /// Register address
    pub register: u8,
    /// Value to write
    pub value: u8,
}

impl RegisterWrite {
    /// Create a register write
    pub const fn new(register: u8, value: u8) -> Self {
        Self { register, value }
    }

    /// Bytes placed on the bus: `[register][value]`
    pub const fn to_bytes(self) -> [u8; 2] {
        [self.register, self.value]
    }
}

/// A bit pattern to watch in one 8-bit register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EventMask {
    /// Register address
    pub register: u8,
    /// Bits that signal the event when any of them is set
    pub mask: u8,
}

impl EventMask {
    /// Create an event mask
    pub const fn new(register: u8, mask: u8) -> Self {
        Self { register, mask }
    }

    /// Whether a register reading asserts this mask
    pub const fn is_tripped_by(self, reading: u8) -> bool {
        reading & self.mask != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bytes_are_register_then_value() {
        assert_eq!(RegisterWrite::new(0x7E, 0x11).to_bytes(), [0x7E, 0x11]);
    }

    #[test]
    fn test_mask_trip() {
        let any_motion = EventMask::new(0x1C, 0x04);
        assert!(any_motion.is_tripped_by(0x06));
        assert!(!any_motion.is_tripped_by(0x02));
        assert!(!any_motion.is_tripped_by(0x00));
    }

    #[test]
    fn test_empty_mask_never_trips() {
        assert!(!EventMask::new(0x02, 0x00).is_tripped_by(0xFF));
    }
}
