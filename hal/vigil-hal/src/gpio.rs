//! GPIO pin abstractions
//!
//! The watcher and controller talk over two single-bit level lines. Each side
//! drives one line through an [`OutputPin`] and samples the other through an
//! [`InputPin`].

use portable_atomic::{AtomicBool, Ordering};

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently driven high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently driven low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Digital input pin
///
/// Implementations should handle the actual hardware register reading
/// for the specific chip.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&self) -> bool;

    /// Check if the pin reads low (logic 0)
    fn is_low(&self) -> bool {
        !self.is_high()
    }
}

impl<T: OutputPin + ?Sized> OutputPin for &mut T {
    fn set_high(&mut self) {
        (**self).set_high();
    }

    fn set_low(&mut self) {
        (**self).set_low();
    }

    fn is_set_high(&self) -> bool {
        (**self).is_set_high()
    }
}

impl<T: InputPin + ?Sized> InputPin for &T {
    fn is_high(&self) -> bool {
        (**self).is_high()
    }
}

impl<T: InputPin + ?Sized> InputPin for &mut T {
    fn is_high(&self) -> bool {
        (**self).is_high()
    }
}

/// A level signal shared by two execution contexts
///
/// Models a wire between an output on one side and an input on the other
/// when both contexts can address the same memory (two cores of one chip,
/// or two host threads in a simulation). A shared reference is both the
/// driving end and the sampling end; the line itself pulls low at reset.
#[derive(Debug, Default)]
pub struct LevelLine {
    level: AtomicBool,
}

impl LevelLine {
    /// Create a line resting low
    pub const fn new() -> Self {
        Self {
            level: AtomicBool::new(false),
        }
    }

    /// Current level of the line
    pub fn level(&self) -> bool {
        self.level.load(Ordering::Acquire)
    }

    /// Drive the line to the given level
    pub fn drive(&self, high: bool) {
        self.level.store(high, Ordering::Release);
    }
}

impl OutputPin for &LevelLine {
    fn set_high(&mut self) {
        self.drive(true);
    }

    fn set_low(&mut self) {
        self.drive(false);
    }

    fn is_set_high(&self) -> bool {
        self.level()
    }
}

impl InputPin for LevelLine {
    fn is_high(&self) -> bool {
        self.level()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_rests_low() {
        let line = LevelLine::new();
        assert!(line.is_low());
    }

    #[test]
    fn test_output_end_drives_input_end() {
        let line = LevelLine::new();
        let mut out = &line;

        out.set_high();
        assert!(line.is_high());
        assert!(out.is_set_high());

        out.set_state(false);
        assert!(line.is_low());
        assert!(out.is_set_low());
    }

    #[test]
    fn test_borrowed_input_reads_through() {
        let line = LevelLine::new();
        line.drive(true);

        let input: &LevelLine = &line;
        assert!(InputPin::is_high(&input));
    }
}
