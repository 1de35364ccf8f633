//! Hardware abstraction traits
//!
//! The core drives panels and the serial link exclusively through these
//! seams; the firmware supplies the concrete implementations and tests
//! supply in-memory doubles.

pub mod panel;
pub mod serial;

pub use panel::{PanelDriver, PanelError};
pub use serial::SerialPort;
