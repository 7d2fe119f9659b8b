//! embedded-hal 1.0 adapters
//!
//! Wrap a board's embedded-hal peripherals so the watcher and controller can
//! use them through the narrower `vigil-hal` traits. Pins are restricted to
//! infallible implementations; a handshake line that can fail to toggle has
//! no sensible recovery.

use core::cell::RefCell;
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital;
use embedded_hal::i2c::{self, ErrorKind, I2c};
use vigil_hal::{DelayCycles, I2cBus, I2cError, I2cErrorKind, InputPin, OutputPin};

/// Error returned by an [`EhI2c`] transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EhI2cError<E>(pub E);

impl<E: i2c::Error> I2cError for EhI2cError<E> {
    fn kind(&self) -> I2cErrorKind {
        // embedded-hal has no timeout kind
        match self.0.kind() {
            ErrorKind::NoAcknowledge(_) => I2cErrorKind::Nack,
            ErrorKind::ArbitrationLoss => I2cErrorKind::ArbitrationLost,
            _ => I2cErrorKind::Other,
        }
    }
}

/// Blocking I2C master
#[derive(Debug)]
pub struct EhI2c<T> {
    bus: T,
}

impl<T: I2c> EhI2c<T> {
    pub fn new(bus: T) -> Self {
        Self { bus }
    }

    pub fn release(self) -> T {
        self.bus
    }
}

impl<T: I2c> I2cBus for EhI2c<T> {
    type Error = EhI2cError<T::Error>;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        I2c::write(&mut self.bus, address, data).map_err(EhI2cError)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        I2c::read(&mut self.bus, address, buf).map_err(EhI2cError)
    }
}

/// Push-pull output that remembers its last driven level
#[derive(Debug)]
pub struct EhOutput<P> {
    pin: P,
    high: bool,
}

impl<P: digital::OutputPin<Error = Infallible>> EhOutput<P> {
    /// Take the pin and drive it low
    pub fn new(mut pin: P) -> Self {
        if let Err(e) = digital::OutputPin::set_low(&mut pin) {
            match e {}
        }
        Self { pin, high: false }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: digital::OutputPin<Error = Infallible>> OutputPin for EhOutput<P> {
    fn set_high(&mut self) {
        if let Err(e) = digital::OutputPin::set_high(&mut self.pin) {
            match e {}
        }
        self.high = true;
    }

    fn set_low(&mut self) {
        if let Err(e) = digital::OutputPin::set_low(&mut self.pin) {
            match e {}
        }
        self.high = false;
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

/// Input pin readable through a shared reference
///
/// embedded-hal reads take `&mut self`; the handshake only ever holds a
/// shared one.
#[derive(Debug)]
pub struct EhInput<P> {
    pin: RefCell<P>,
}

impl<P: digital::InputPin<Error = Infallible>> EhInput<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin: RefCell::new(pin),
        }
    }

    pub fn release(self) -> P {
        self.pin.into_inner()
    }
}

impl<P: digital::InputPin<Error = Infallible>> InputPin for EhInput<P> {
    fn is_high(&self) -> bool {
        match digital::InputPin::is_high(&mut *self.pin.borrow_mut()) {
            Ok(high) => high,
            Err(e) => match e {},
        }
    }
}

/// Cycle delay on top of a nanosecond delay
#[derive(Debug)]
pub struct EhDelay<D> {
    delay: D,
    cpu_hz: u32,
}

impl<D: DelayNs> EhDelay<D> {
    /// `cpu_hz` is the clock the cycle counts are expressed in
    pub fn new(delay: D, cpu_hz: u32) -> Self {
        Self { delay, cpu_hz }
    }

    pub fn cpu_hz(&self) -> u32 {
        self.cpu_hz
    }

    /// Nanoseconds spanned by `cycles`, saturating
    pub fn cycles_to_ns(&self, cycles: u32) -> u32 {
        if self.cpu_hz == 0 {
            return 0;
        }
        let ns = cycles as u64 * 1_000_000_000 / self.cpu_hz as u64;
        ns.min(u32::MAX as u64) as u32
    }

    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> DelayCycles for EhDelay<D> {
    fn delay_cycles(&mut self, cycles: u32) {
        let ns = self.cycles_to_ns(cycles);
        if ns > 0 {
            self.delay.delay_ns(ns);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::i2c::{NoAcknowledgeSource, Operation};
    use vigil_core::{BusError, SensorBus};
    use vigil_protocol::RegisterWrite;

    struct MockI2c {
        registers: [u8; 256],
        pointer: u8,
        present: u8,
        fail: Option<ErrorKind>,
    }

    impl MockI2c {
        fn new(present: u8) -> Self {
            Self {
                registers: [0; 256],
                pointer: 0,
                present,
                fail: None,
            }
        }
    }

    impl i2c::ErrorType for MockI2c {
        type Error = ErrorKind;
    }

    impl I2c for MockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if let Some(kind) = self.fail {
                return Err(kind);
            }
            if address != self.present {
                return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if let Some((&reg, rest)) = bytes.split_first() {
                            self.pointer = reg;
                            for &b in rest {
                                self.registers[self.pointer as usize] = b;
                                self.pointer = self.pointer.wrapping_add(1);
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        for b in buf.iter_mut() {
                            *b = self.registers[self.pointer as usize];
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                    }
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockPin {
        high: bool,
        reads: u32,
    }

    impl digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl digital::OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    impl digital::InputPin for MockPin {
        fn is_high(&mut self) -> Result<bool, Infallible> {
            self.reads += 1;
            Ok(self.high)
        }

        fn is_low(&mut self) -> Result<bool, Infallible> {
            self.reads += 1;
            Ok(!self.high)
        }
    }

    #[derive(Default)]
    struct MockDelay {
        total_ns: u64,
    }

    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    #[test]
    fn test_register_access_through_sensor_bus() {
        let mut bus = SensorBus::new(EhI2c::new(MockI2c::new(0x69)));
        bus.write_register(0x69, RegisterWrite::new(0x40, 0x2B)).unwrap();
        assert_eq!(bus.read_register(0x69, 0x40), Ok(0x2B));
    }

    #[test]
    fn test_absent_device_is_nack() {
        let mut bus = SensorBus::new(EhI2c::new(MockI2c::new(0x69)));
        assert_eq!(bus.read_register(0x68, 0x00), Err(BusError::Nack));
    }

    #[test]
    fn test_error_kinds() {
        let mut mock = MockI2c::new(0x69);
        mock.fail = Some(ErrorKind::ArbitrationLoss);
        let mut i2c = EhI2c::new(mock);
        let err = i2c.write(0x69, &[0x7E, 0x11]).unwrap_err();
        assert_eq!(err.kind(), I2cErrorKind::ArbitrationLost);

        assert_eq!(EhI2cError(ErrorKind::Bus).kind(), I2cErrorKind::Other);
        assert_eq!(EhI2cError(ErrorKind::Overrun).kind(), I2cErrorKind::Other);
    }

    #[test]
    fn test_output_starts_low_and_tracks_level() {
        let mut out = EhOutput::new(MockPin {
            high: true,
            reads: 0,
        });
        assert!(out.is_set_low());

        out.set_high();
        assert!(out.is_set_high());
        assert!(out.release().high);
    }

    #[test]
    fn test_input_reads_through_shared_reference() {
        let input = EhInput::new(MockPin {
            high: true,
            reads: 0,
        });
        let shared = &input;
        assert!(shared.is_high());
        assert!(!shared.is_low());
        assert_eq!(input.release().reads, 2);
    }

    #[test]
    fn test_cycles_to_nanoseconds() {
        let mut delay = EhDelay::new(MockDelay::default(), 125_000_000);
        assert_eq!(delay.cycles_to_ns(125), 1_000);

        delay.delay_cycles(125_000);
        delay.delay_cycles(0);
        assert_eq!(delay.release().total_ns, 1_000_000);
    }

    #[test]
    fn test_long_delays_saturate() {
        let delay = EhDelay::new(MockDelay::default(), 1);
        assert_eq!(delay.cycles_to_ns(10), u32::MAX);

        let stopped = EhDelay::new(MockDelay::default(), 0);
        assert_eq!(stopped.cycles_to_ns(10), 0);
    }
}
