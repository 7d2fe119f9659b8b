//! Watcher state machine
//!
//! Defines the authoritative lifecycle of the watcher.
//! The state machine is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::WatcherEvent;
pub use machine::{HaltReason, WatcherState};
