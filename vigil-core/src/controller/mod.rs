//! Controller-side counterpart of the watcher
//!
//! The controller publishes the shared configuration, releases the watcher,
//! then services its reports and decides what to do when it halts.

pub mod agent;
pub mod policy;
pub mod sink;

pub use agent::{ControllerAgent, ControllerError, ControllerState};
pub use policy::{ControllerAction, RestartPolicy};
pub use sink::{Report, StatusSink};
