//! Single-slot report mailbox
//!
//! The watcher is the only writer of the report words and the only one that
//! moves the phase tag; the controller only receives. All fields are atomics
//! so the mailbox can live in memory both processors address without any
//! `unsafe`.

use portable_atomic::{AtomicBool, AtomicI32, AtomicU32, AtomicU8, Ordering};
use vigil_protocol::StatusFields;

use super::message::HandshakeMessage;
use super::HandshakeError;

/// Handshake phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Phase {
    /// No message in flight
    Idle = 0,
    /// Message written, DRIVE raised
    Signaled = 1,
    /// Controller raised DRIVEN; DRIVE is being cleared
    Acked = 2,
    /// Both lines low again
    Drained = 3,
}

impl Phase {
    /// Decode a raw phase tag
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Idle),
            1 => Some(Self::Signaled),
            2 => Some(Self::Acked),
            3 => Some(Self::Drained),
            _ => None,
        }
    }

    /// Phase after a successful acknowledgement step
    pub const fn next(self) -> Self {
        match self {
            Self::Idle => Self::Signaled,
            Self::Signaled => Self::Acked,
            Self::Acked => Self::Drained,
            Self::Drained => Self::Idle,
        }
    }

    /// Whether a message is in flight
    pub const fn in_flight(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// Single-slot mailbox with a phase tag
#[derive(Debug)]
pub struct Mailbox {
    phase: AtomicU8,
    status: AtomicI32,
    address: AtomicU32,
    error: AtomicI32,
    consumed: AtomicBool,
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox {
    /// Empty mailbox
    pub const fn new() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Idle as u8),
            status: AtomicI32::new(StatusFields::IDLE.status),
            address: AtomicU32::new(StatusFields::IDLE.address),
            error: AtomicI32::new(StatusFields::IDLE.error),
            consumed: AtomicBool::new(false),
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        // Only this module stores the tag, always from a `Phase`.
        Phase::from_raw(self.phase.load(Ordering::Acquire)).unwrap_or(Phase::Idle)
    }

    /// Raw report words as they sit in memory
    pub fn fields(&self) -> StatusFields {
        StatusFields {
            status: self.status.load(Ordering::Acquire),
            address: self.address.load(Ordering::Acquire),
            error: self.error.load(Ordering::Acquire),
        }
    }

    fn store_fields(&self, fields: StatusFields) {
        self.status.store(fields.status, Ordering::Relaxed);
        self.address.store(fields.address, Ordering::Relaxed);
        self.error.store(fields.error, Ordering::Relaxed);
    }

    /// Put a message in the slot and move to [`Phase::Signaled`]
    ///
    /// Fails with [`HandshakeError::Busy`] unless the mailbox is idle; the
    /// message in flight is never overwritten.
    pub fn try_send(&self, message: HandshakeMessage) -> Result<(), HandshakeError> {
        if self.phase().in_flight() {
            return Err(HandshakeError::Busy);
        }
        self.store_fields(message.to_fields());
        self.consumed.store(false, Ordering::Relaxed);
        self.phase.store(Phase::Signaled as u8, Ordering::Release);
        Ok(())
    }

    /// Take the in-flight message
    ///
    /// Each message can be received once, while the phase is
    /// [`Phase::Signaled`] or [`Phase::Acked`].
    pub fn try_receive(&self) -> Result<HandshakeMessage, HandshakeError> {
        match self.phase() {
            Phase::Signaled | Phase::Acked => {}
            Phase::Idle | Phase::Drained => return Err(HandshakeError::NotInFlight),
        }
        if self.consumed.swap(true, Ordering::AcqRel) {
            return Err(HandshakeError::AlreadyConsumed);
        }
        Ok(HandshakeMessage::from_fields(self.fields())?)
    }

    /// Advance the phase one step towards [`Phase::Idle`]
    ///
    /// Returns the new phase. Leaving [`Phase::Drained`] clears the slot.
    pub fn ack(&self) -> Result<Phase, HandshakeError> {
        let phase = self.phase();
        if !phase.in_flight() {
            return Err(HandshakeError::NotInFlight);
        }
        let next = phase.next();
        if next == Phase::Idle {
            self.store_fields(StatusFields::IDLE);
        }
        self.phase.store(next as u8, Ordering::Release);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_receive_ack_cycle() {
        let mailbox = Mailbox::new();
        let message = HandshakeMessage::fault(0, 0);

        mailbox.try_send(message).unwrap();
        assert_eq!(mailbox.phase(), Phase::Signaled);
        assert_eq!(mailbox.try_receive(), Ok(message));

        assert_eq!(mailbox.ack(), Ok(Phase::Acked));
        assert_eq!(mailbox.ack(), Ok(Phase::Drained));
        assert_eq!(mailbox.ack(), Ok(Phase::Idle));
        assert_eq!(mailbox.fields(), StatusFields::IDLE);
    }

    #[test]
    fn test_single_flight() {
        let mailbox = Mailbox::new();
        let first = HandshakeMessage::fault(0, 3);
        mailbox.try_send(first).unwrap();

        for _ in 0..3 {
            assert_eq!(
                mailbox.try_send(HandshakeMessage::checkin()),
                Err(HandshakeError::Busy)
            );
            assert_eq!(HandshakeMessage::from_fields(mailbox.fields()), Ok(first));
            mailbox.ack().unwrap();
        }
        assert_eq!(mailbox.phase(), Phase::Idle);
        assert!(mailbox.try_send(HandshakeMessage::checkin()).is_ok());
    }

    #[test]
    fn test_received_once() {
        let mailbox = Mailbox::new();
        mailbox.try_send(HandshakeMessage::checkin()).unwrap();
        assert!(mailbox.try_receive().is_ok());
        assert_eq!(mailbox.try_receive(), Err(HandshakeError::AlreadyConsumed));

        mailbox.ack().unwrap();
        assert_eq!(mailbox.try_receive(), Err(HandshakeError::AlreadyConsumed));
    }

    #[test]
    fn test_nothing_to_receive_or_ack_when_idle() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.try_receive(), Err(HandshakeError::NotInFlight));
        assert_eq!(mailbox.ack(), Err(HandshakeError::NotInFlight));
    }

    #[test]
    fn test_drained_message_cannot_be_received() {
        let mailbox = Mailbox::new();
        mailbox.try_send(HandshakeMessage::checkin()).unwrap();
        mailbox.ack().unwrap();
        mailbox.ack().unwrap();
        assert_eq!(mailbox.phase(), Phase::Drained);
        assert_eq!(mailbox.try_receive(), Err(HandshakeError::NotInFlight));
    }
}
