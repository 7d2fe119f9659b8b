//! Controller agent
//!
//! Runs on the controller as an async task. The controller's DRIVEN output
//! and its view of the watcher's DRIVE line are the same two wires the
//! watcher's [`HandshakeChannel`](crate::HandshakeChannel) uses, seen from
//! the other end.

use vigil_hal::{InputPin, OutputPin};

use super::policy::{ControllerAction, RestartPolicy};
use super::sink::{Report, StatusSink};
use crate::config::{ConfigError, SharedConfiguration};
use crate::handshake::{poll_until_async, HandshakeError, Mailbox, Phase, WaitPolicy};

/// Controller lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerState {
    /// Shared configuration not yet published
    Unconfigured,
    /// Configuration published; watcher not released
    Configured,
    /// Watcher released; servicing reports
    Servicing,
    /// Restart budget spent
    Degraded,
}

/// Controller-side failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerError {
    /// Operation needs a different controller state
    WrongState(ControllerState),
    /// Configuration could not be published
    Config(ConfigError),
    /// Handshake failure
    Handshake(HandshakeError),
}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<HandshakeError> for ControllerError {
    fn from(err: HandshakeError) -> Self {
        Self::Handshake(err)
    }
}

impl From<crate::handshake::WaitAbandoned> for ControllerError {
    fn from(_: crate::handshake::WaitAbandoned) -> Self {
        Self::Handshake(HandshakeError::Abandoned)
    }
}

impl core::fmt::Display for ControllerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WrongState(state) => write!(f, "not allowed while {state:?}"),
            Self::Config(err) => write!(f, "config: {err}"),
            Self::Handshake(err) => write!(f, "handshake: {err}"),
        }
    }
}

impl core::error::Error for ControllerError {}

/// Controller end of the handshake
pub struct ControllerAgent<'m, O, I, P> {
    mailbox: &'m Mailbox,
    driven: O,
    drive: I,
    policy: P,
    state: ControllerState,
    restarts: RestartPolicy,
}

impl<'m, O, I, P> ControllerAgent<'m, O, I, P>
where
    O: OutputPin,
    I: InputPin,
    P: WaitPolicy,
{
    /// Create an agent; DRIVEN is pulled low
    ///
    /// `driven` is the controller's output, `drive` its input from the
    /// watcher.
    pub fn new(
        mailbox: &'m Mailbox,
        mut driven: O,
        drive: I,
        policy: P,
        restarts: RestartPolicy,
    ) -> Self {
        driven.set_low();
        Self {
            mailbox,
            driven,
            drive,
            policy,
            state: ControllerState::Unconfigured,
            restarts,
        }
    }

    /// Current state
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// Restart budget
    pub fn restart_policy(&self) -> &RestartPolicy {
        &self.restarts
    }

    /// Validate `config` and write it into the shared image
    ///
    /// Must complete before [`release`](Self::release).
    pub fn publish(
        &mut self,
        config: &SharedConfiguration,
        image: &mut [u8],
    ) -> Result<usize, ControllerError> {
        if matches!(self.state, ControllerState::Servicing | ControllerState::Degraded) {
            return Err(ControllerError::WrongState(self.state));
        }
        let written = config.write_image(image)?;
        info!("configuration published ({=usize} bytes)", written);
        self.state = ControllerState::Configured;
        Ok(written)
    }

    /// Release the watcher
    ///
    /// Raise DRIVEN, wait for the watcher to raise DRIVE, lower DRIVEN, wait
    /// for DRIVE to drop.
    pub async fn release(&mut self) -> Result<(), ControllerError> {
        if self.state != ControllerState::Configured {
            return Err(ControllerError::WrongState(self.state));
        }
        self.driven.set_high();

        let drive = &self.drive;
        poll_until_async(|| drive.is_high(), self.policy).await?;
        self.driven.set_low();

        let drive = &self.drive;
        poll_until_async(|| drive.is_low(), self.policy).await?;

        info!("watcher released");
        self.state = ControllerState::Servicing;
        Ok(())
    }

    /// Whether the watcher has raised a report
    pub fn report_pending(&self) -> bool {
        self.drive.is_high() && self.mailbox.phase() == Phase::Signaled
    }

    /// Take the next report through the handshake
    ///
    /// Waits for DRIVE, reads the mailbox, raises DRIVEN, waits for DRIVE to
    /// drop, lowers DRIVEN. A report that cannot be read is still
    /// acknowledged, so the watcher's mailbox returns to idle before the
    /// error is returned.
    pub async fn service(&mut self) -> Result<Report, ControllerError> {
        if self.state != ControllerState::Servicing {
            return Err(ControllerError::WrongState(self.state));
        }

        let drive = &self.drive;
        poll_until_async(|| drive.is_high(), self.policy).await?;
        let received = self.mailbox.try_receive();
        self.driven.set_high();

        let drive = &self.drive;
        poll_until_async(|| drive.is_low(), self.policy).await?;
        self.driven.set_low();

        let message = received.inspect_err(|err| warn!("report dropped: {}", err))?;
        debug!("report serviced: {}", message);
        Ok(Report::from(message))
    }

    /// Hand a report to the application and apply the restart policy
    pub fn dispatch<S: StatusSink>(&mut self, report: Report, sink: &mut S) -> ControllerAction {
        sink.status_update(&report);
        match report {
            Report::Normal => ControllerAction::Continue,
            Report::Checkin => {
                sink.checkin();
                ControllerAction::Continue
            }
            Report::SensorFault {
                address_index,
                mask_index,
            } => {
                warn!(
                    "sensor {=u8} event mask {=u8} tripped",
                    address_index,
                    mask_index
                );
                sink.sensor_fault(address_index, mask_index);
                ControllerAction::Continue
            }
            Report::WatcherHalted {
                address_index,
                error_code,
            } => {
                error!(
                    "watcher halted on sensor {=u8}, error {=i32}",
                    address_index,
                    error_code
                );
                sink.watcher_halted(address_index, error_code);
                let action = self.restarts.on_halt();
                match action {
                    ControllerAction::RestartWatcher => {
                        info!("restarting watcher ({=u8} used)", self.restarts.restarts());
                        self.state = ControllerState::Configured;
                    }
                    _ => {
                        error!("restart budget spent; device degraded");
                        self.state = ControllerState::Degraded;
                        sink.degraded();
                    }
                }
                action
            }
        }
    }

    /// Service one report and dispatch it
    pub async fn service_once<S: StatusSink>(
        &mut self,
        sink: &mut S,
    ) -> Result<ControllerAction, ControllerError> {
        let report = self.service().await?;
        Ok(self.dispatch(report, sink))
    }
}
