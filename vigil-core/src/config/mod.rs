//! Configuration types
//!
//! The controller-written [`SharedConfiguration`] and the watcher's own
//! timing [`WatcherOptions`].

pub mod options;
pub mod shared;

pub use options::*;
pub use shared::*;
