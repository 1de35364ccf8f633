//! Display configuration types and calibration geometry
//!
//! Configurations are built at registration time from an external table;
//! only `UPDATE_CONFIG` mutates them afterwards, and never partially.

pub mod calibration;
pub mod display;

pub use calibration::*;
pub use display::*;
