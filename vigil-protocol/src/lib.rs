//! Watcher / controller shared-memory contract
//!
//! This crate defines the fixed-shape data the two processors exchange
//! through the memory block they can both address:
//!
//! ```text
//! controller-written (before release)        watcher-written (per report)
//! ┌──────────────────────────────────┐       ┌─────────┬─────────┬───────┐
//! │ config table  │ addresses │ masks│       │ STATUS  │ ADDRESS │ ERROR │
//! │ timer regs │ threshold │ commands│       │ i32     │ u32     │ i32   │
//! └──────────────────────────────────┘       └─────────┴─────────┴───────┘
//! ```
//!
//! The configuration block travels as a fixed-size [`image`]; reports travel
//! as a [`status::StatusFields`] tuple whose `status` word uses the
//! negative-sentinel encoding described in [`status`].

#![no_std]
#![deny(unsafe_code)]

pub mod image;
pub mod registers;
pub mod status;

pub use image::{decode_image, encode_image, DecodedImage, ImageError, ImageFields, IMAGE_LEN};
pub use registers::{
    EventMask, RegisterWrite, MAX_CONFIG_ENTRIES, MAX_EVENT_MASKS, MAX_SENSORS,
    TIMER_REGISTER_COUNT,
};
pub use status::{error_code, StatusCode, StatusError, StatusFields};
