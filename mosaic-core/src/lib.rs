//! Board-agnostic core logic for the Mosaic display system
//!
//! This crate contains all logic that does not depend on specific
//! hardware:
//!
//! - Hardware abstraction traits (panel driver, serial port)
//! - Display configuration and calibration geometry
//! - The bounded display registry and per-display instance state
//! - The pixel snapshot store
//! - The serial protocol engine (state machine driving the registry)
//!
//! Frame footprints and pixel snapshots are heap-allocated; the composing
//! binary provides a global allocator.

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod color;
pub mod config;
pub mod display;
pub mod engine;
pub mod snapshot;
pub mod traits;
