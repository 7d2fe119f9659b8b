//! Watcher side of the handshake
//!
//! Owns the DRIVE output and the DRIVEN input and moves the mailbox through
//! its phases as the controller answers on DRIVEN.

use vigil_hal::{DelayCycles, InputPin, OutputPin};

use super::mailbox::{Mailbox, Phase};
use super::message::HandshakeMessage;
use super::wait::{poll_until, WaitPolicy};
use super::HandshakeError;

/// Watcher end of the four-phase handshake
pub struct HandshakeChannel<'m, D, N, P> {
    mailbox: &'m Mailbox,
    drive: D,
    driven: N,
    policy: P,
}

impl<'m, D, N, P> HandshakeChannel<'m, D, N, P>
where
    D: OutputPin,
    N: InputPin,
    P: WaitPolicy,
{
    /// Create a channel; DRIVE is pulled low
    pub fn new(mailbox: &'m Mailbox, mut drive: D, driven: N, policy: P) -> Self {
        drive.set_low();
        Self {
            mailbox,
            drive,
            driven,
            policy,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.mailbox.phase()
    }

    /// The shared mailbox
    pub fn mailbox(&self) -> &'m Mailbox {
        self.mailbox
    }

    /// Level currently driven on DRIVE
    pub fn drive_level(&self) -> bool {
        self.drive.is_set_high()
    }

    /// Level currently seen on DRIVEN
    pub fn driven_level(&self) -> bool {
        self.driven.is_high()
    }

    /// Idle → Signaled: write the message, then raise DRIVE
    pub fn raise(&mut self, message: HandshakeMessage) -> Result<(), HandshakeError> {
        self.mailbox.try_send(message)?;
        self.drive.set_high();
        debug!("report raised: {}", message);
        trace!("handshake {} -> {}", Phase::Idle, Phase::Signaled);
        Ok(())
    }

    /// Whether the line level allows leaving the current phase
    pub fn gate_open(&self) -> bool {
        match self.phase() {
            Phase::Idle => false,
            Phase::Signaled => self.driven.is_high(),
            Phase::Acked => self.driven.is_low(),
            Phase::Drained => true,
        }
    }

    /// Advance one phase if its gate is open, without waiting
    ///
    /// Returns the phase after the step.
    pub fn step(&mut self) -> Result<Phase, HandshakeError> {
        let phase = self.phase();
        if phase == Phase::Idle || !self.gate_open() {
            return Ok(phase);
        }
        let next = self.mailbox.ack()?;
        if next == Phase::Acked {
            self.drive.set_low();
        }
        trace!("handshake {} -> {}", phase, next);
        Ok(next)
    }

    /// Run the in-flight message through to [`Phase::Idle`]
    pub fn complete<T: DelayCycles>(&mut self, delay: &mut T) -> Result<(), HandshakeError> {
        while self.phase().in_flight() {
            let driven = &self.driven;
            match self.phase() {
                Phase::Signaled => poll_until(|| driven.is_high(), self.policy, delay)?,
                Phase::Acked => poll_until(|| driven.is_low(), self.policy, delay)?,
                Phase::Idle | Phase::Drained => {}
            }
            self.step()?;
        }
        Ok(())
    }

    /// Raise a message and wait for the controller to take it
    pub fn deliver<T: DelayCycles>(
        &mut self,
        message: HandshakeMessage,
        delay: &mut T,
    ) -> Result<(), HandshakeError> {
        self.raise(message)?;
        self.complete(delay)
    }

    /// Wait for the controller to release the watcher
    ///
    /// The controller raises DRIVEN once the shared configuration is
    /// published. The watcher answers on DRIVE, the controller drops DRIVEN,
    /// and the watcher drops DRIVE, leaving both lines low.
    pub fn await_release<T: DelayCycles>(&mut self, delay: &mut T) -> Result<(), HandshakeError> {
        if self.phase().in_flight() {
            return Err(HandshakeError::Busy);
        }
        let driven = &self.driven;
        poll_until(|| driven.is_high(), self.policy, delay)?;
        self.drive.set_high();

        let driven = &self.driven;
        poll_until(|| driven.is_low(), self.policy, delay)?;
        self.drive.set_low();
        trace!("released by controller");
        Ok(())
    }
}
