//! Watcher to controller handshake
//!
//! Two level lines and a single-slot [`Mailbox`]:
//!
//! ```text
//!            watcher                          controller
//!   DRIVE  ──────────────────────────────────▶  (input)
//!  (input) ◀──────────────────────────────────  DRIVEN
//!
//!   phase     DRIVE  DRIVEN   gate to leave the phase
//!   Idle        0      0      watcher has a message
//!   Signaled    1      0      DRIVEN high
//!   Acked       0      1      DRIVEN low
//!   Drained     0      0      none
//! ```
//!
//! Only one message is ever in flight. Waits on the watcher side have no
//! timeout unless the [`WaitPolicy`] says otherwise.

pub mod channel;
pub mod mailbox;
pub mod message;
pub mod wait;

pub use channel::HandshakeChannel;
pub use mailbox::{Mailbox, Phase};
pub use message::{HandshakeMessage, Status};
pub use wait::{poll_until, poll_until_async, Attempts, Forever, WaitAbandoned, WaitPolicy};

use vigil_protocol::StatusError;

/// Handshake protocol violations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandshakeError {
    /// A message is already in flight
    Busy,
    /// No message is in flight
    NotInFlight,
    /// The in-flight message was already received
    AlreadyConsumed,
    /// The wait policy gave up
    Abandoned,
    /// The mailbox holds a status word that does not decode
    Malformed(StatusError),
}

impl From<WaitAbandoned> for HandshakeError {
    fn from(_: WaitAbandoned) -> Self {
        Self::Abandoned
    }
}

impl From<StatusError> for HandshakeError {
    fn from(err: StatusError) -> Self {
        Self::Malformed(err)
    }
}

impl core::fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy => write!(f, "a message is already in flight"),
            Self::NotInFlight => write!(f, "no message in flight"),
            Self::AlreadyConsumed => write!(f, "message already received"),
            Self::Abandoned => write!(f, "wait abandoned"),
            Self::Malformed(err) => write!(f, "malformed report: {err}"),
        }
    }
}

impl core::error::Error for HandshakeError {}
