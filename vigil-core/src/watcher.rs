//! Watcher main loop
//!
//! Composes bring-up, polling, watchdog sampling and the handshake into the
//! watcher's state machine. Each call to [`Watcher::step`] does one unit of
//! work for the current state:
//!
//! - `AwaitController`: power-on delay, release handshake, read the shared
//!   configuration
//! - `BringUp`: reset, configure, validate and start every sensor, then seed
//!   the watchdog clock
//! - `Monitor`: deliver the message queued last iteration, poll once, sample
//!   once, queue at most one new message, pause
//!
//! Every failure the watcher cannot recover from is escalated as a
//! `BUS_ERROR` report before the watcher halts.

use heapless::Vec;
use vigil_hal::{DelayCycles, I2cBus, InputPin, OutputPin};
use vigil_protocol::{error_code, MAX_SENSORS};

use crate::bus::SensorBus;
use crate::config::{SharedConfiguration, WatcherOptions};
use crate::error::{BringUpError, BusError};
use crate::handshake::{Forever, HandshakeChannel, HandshakeMessage, Mailbox, WaitPolicy};
use crate::sensor::{
    ClockVerdict, DeviceState, EventPoller, SensorConfigEngine, WatchdogClock, WatchdogTimer,
};
use crate::state::{HaltReason, WatcherEvent, WatcherState};

/// The watcher: one sensor bus, one handshake channel, one delay source
pub struct Watcher<'a, B, D, N, P, T> {
    image: &'a [u8],
    config: Option<SharedConfiguration>,
    options: WatcherOptions,
    bus: SensorBus<B>,
    channel: HandshakeChannel<'a, D, N, P>,
    delay: T,
    state: WatcherState,
    clock: WatchdogClock,
    devices: Vec<DeviceState, MAX_SENSORS>,
    pending: Option<HandshakeMessage>,
}

impl<'a, B, D, N, P, T> Watcher<'a, B, D, N, P, T>
where
    B: I2cBus,
    D: OutputPin,
    N: InputPin,
    P: WaitPolicy,
    T: DelayCycles,
{
    /// Create a watcher reading its configuration from `image`
    ///
    /// The image is only read after the controller has released the
    /// watcher.
    pub fn new(
        image: &'a [u8],
        options: WatcherOptions,
        bus: B,
        channel: HandshakeChannel<'a, D, N, P>,
        delay: T,
    ) -> Self {
        Self {
            image,
            config: None,
            options,
            bus: SensorBus::new(bus),
            channel,
            delay,
            state: WatcherState::AwaitController,
            clock: WatchdogClock::new(),
            devices: Vec::new(),
            pending: None,
        }
    }

    /// Current state
    pub fn state(&self) -> WatcherState {
        self.state
    }

    /// Configuration read at release, if any
    pub fn config(&self) -> Option<&SharedConfiguration> {
        self.config.as_ref()
    }

    /// Message waiting for the next iteration
    pub fn pending(&self) -> Option<HandshakeMessage> {
        self.pending
    }

    /// Per-address outcome of the last bring-up, in address order
    ///
    /// Addresses after a failed one were never attempted and are absent.
    pub fn devices(&self) -> &[DeviceState] {
        &self.devices
    }

    /// Watchdog reference
    pub fn clock(&self) -> &WatchdogClock {
        &self.clock
    }

    /// Sensor bus
    pub fn bus(&self) -> &SensorBus<B> {
        &self.bus
    }

    /// Mutable sensor bus
    pub fn bus_mut(&mut self) -> &mut SensorBus<B> {
        &mut self.bus
    }

    /// Handshake channel
    pub fn channel(&self) -> &HandshakeChannel<'a, D, N, P> {
        &self.channel
    }

    /// Run until the watcher halts
    pub fn run(&mut self) -> HaltReason {
        loop {
            if let WatcherState::Halted(reason) = self.step() {
                return reason;
            }
        }
    }

    /// Do one unit of work and return the resulting state
    pub fn step(&mut self) -> WatcherState {
        let event = match self.state {
            WatcherState::AwaitController => self.await_controller(),
            WatcherState::BringUp => Some(self.bring_up()),
            WatcherState::Monitor => self.monitor(),
            WatcherState::Halted(_) => None,
        };

        if let Some(event) = event {
            let next = self.state.transition(event);
            if next != self.state {
                info!("watcher {} -> {}", self.state, next);
            }
            if let WatcherState::Halted(reason) = next {
                match reason.kind() {
                    Some(kind) => error!("watcher halted: {} ({})", reason, kind),
                    None => error!("watcher halted: {}", reason),
                }
            }
            self.state = next;
        }
        self.state
    }

    fn await_controller(&mut self) -> Option<WatcherEvent> {
        self.delay.delay_cycles(self.options.power_on_cycles);

        if let Err(err) = self.channel.await_release(&mut self.delay) {
            warn!("release handshake failed: {}", err);
            return Some(WatcherEvent::Halt(HaltReason::ControllerUnresponsive));
        }

        match SharedConfiguration::from_image(self.image) {
            Ok(config) => {
                info!(
                    "released: {=usize} entries, {=usize} sensors, {=usize} masks",
                    config.config_table.len(),
                    config.addresses.len(),
                    config.event_masks.len()
                );
                self.config = Some(config);
                Some(WatcherEvent::Released)
            }
            Err(err) => {
                error!("shared configuration unusable: {}", err);
                Some(self.escalate(
                    HandshakeMessage::bus_error(0, error_code::INVALID_ARG),
                    HaltReason::InvalidConfiguration,
                ))
            }
        }
    }

    fn bring_up_all(&mut self) -> Result<(), (u8, BringUpError)> {
        let Some(config) = &self.config else {
            return Ok(());
        };
        let engine = SensorConfigEngine::new(
            &config.config_table,
            config.commands,
            self.options.settle_cycles,
        );

        self.devices.clear();
        for (index, &address) in config.addresses.iter().enumerate() {
            info!("bring-up {=u8:#x}", address);
            let outcome = engine.bring_up(&mut self.bus, &mut self.delay, address);
            self.devices.push(DeviceState::after(&outcome)).ok();
            outcome.map_err(|err| (index as u8, err))?;
            info!("sensor {=u8:#x} ready", address);
        }

        self.clock.reset();
        if let Some(timer) = WatchdogTimer::from_config(config) {
            let sample = timer.sample(&mut self.bus, 0);
            if let ClockVerdict::Seeded(value) = self.clock.observe(sample) {
                debug!("watchdog seeded at {=u32}", value);
            }
        }
        Ok(())
    }

    fn bring_up(&mut self) -> WatcherEvent {
        if self.config.is_none() {
            return WatcherEvent::Halt(HaltReason::InvalidConfiguration);
        }
        match self.bring_up_all() {
            Ok(()) => WatcherEvent::BringUpComplete,
            Err((address_index, error)) => {
                error!("bring-up of sensor {=u8} failed: {}", address_index, error);
                self.escalate(
                    HandshakeMessage::bus_error(address_index, error.code()),
                    HaltReason::BringUpFailed {
                        address_index,
                        error,
                    },
                )
            }
        }
    }

    fn monitor(&mut self) -> Option<WatcherEvent> {
        if let Some(message) = self.pending.take() {
            if let Err(err) = self.channel.deliver(message, &mut self.delay) {
                warn!("report not taken: {}", err);
                return Some(WatcherEvent::Halt(HaltReason::ControllerUnresponsive));
            }
        }

        let Some(config) = &self.config else {
            return Some(WatcherEvent::Halt(HaltReason::InvalidConfiguration));
        };

        let trip = EventPoller::new(&config.addresses, &config.event_masks).poll(&mut self.bus);
        let verdict = match WatchdogTimer::from_config(config) {
            Some(timer) => {
                let sample = timer.sample(&mut self.bus, self.clock.previous());
                self.clock.observe(sample)
            }
            None => ClockVerdict::OnTime,
        };

        if let ClockVerdict::Missed { consecutive, error } = verdict {
            if consecutive >= self.options.max_sample_failures.max(1) {
                return Some(self.sensor_lost(error));
            }
            warn!("watchdog sample failed ({=u8} in a row): {}", consecutive, error);
        }

        if let Some(trip) = trip {
            info!(
                "mask {=u8} tripped on sensor {=u8}",
                trip.mask_index,
                trip.address_index
            );
            self.pending = Some(HandshakeMessage::fault(trip.address_index, trip.mask_index));
        } else if let ClockVerdict::Overdue(value) = verdict {
            debug!("watchdog check-in at {=u32}", value);
            self.clock.checkin(value);
            self.pending = Some(HandshakeMessage::checkin());
        }

        self.delay.delay_cycles(self.options.poll_period_cycles);
        None
    }

    fn sensor_lost(&mut self, error: BusError) -> WatcherEvent {
        error!("watchdog sensor lost: {}", error);
        self.escalate(
            HandshakeMessage::bus_error(0, error.code()),
            HaltReason::SensorLost {
                address_index: 0,
                error,
            },
        )
    }

    /// Report a fatal failure, then halt
    fn escalate(&mut self, message: HandshakeMessage, reason: HaltReason) -> WatcherEvent {
        if let Err(err) = self.channel.deliver(message, &mut self.delay) {
            warn!("escalation not taken: {}", err);
        }
        WatcherEvent::Halt(reason)
    }
}

impl<'a, B, D, N, T> Watcher<'a, B, D, N, Forever, T>
where
    B: I2cBus,
    D: OutputPin,
    N: InputPin,
    T: DelayCycles,
{
    /// Create a watcher whose handshake waits spin for
    /// `options.wait_spin_cycles` between line checks
    pub fn with_lines(
        image: &'a [u8],
        options: WatcherOptions,
        bus: B,
        mailbox: &'a Mailbox,
        drive: D,
        driven: N,
        delay: T,
    ) -> Self {
        let channel = HandshakeChannel::new(mailbox, drive, driven, options.wait_policy());
        Self::new(image, options, bus, channel, delay)
    }
}
