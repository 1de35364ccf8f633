//! Panel driver trait
//!
//! Abstracts one physical display. Drawing primitives are synchronous and
//! infallible: clipping out-of-range coordinates silently is the driver's
//! responsibility. Only bring-up can fail.

use crate::config::Rotation;

/// Errors that can occur during panel bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelError {
    /// Bus transaction failed
    Bus,
    /// Panel did not respond to its init sequence
    NotResponding,
}

/// Trait for a hardware display panel
pub trait PanelDriver {
    /// Initialize the panel; required before any drawing call
    fn init(&mut self) -> Result<(), PanelError>;

    /// Set the panel rotation; `width()`/`height()` reflect it
    fn set_rotation(&mut self, rotation: Rotation);

    /// Fill the whole panel with one RGB565 color
    fn fill_screen(&mut self, color: u16);

    /// Draw a single pixel; out-of-range coordinates are ignored
    fn draw_pixel(&mut self, x: i32, y: i32, color: u16);

    /// Draw a one-pixel rectangle outline
    fn draw_rect(&mut self, x: i32, y: i32, width: u16, height: u16, color: u16);

    /// Draw a straight line between two points
    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16);

    /// Panel width in pixels at the current rotation
    fn width(&self) -> u16;

    /// Panel height in pixels at the current rotation
    fn height(&self) -> u16;

    /// Read one pixel back from panel memory
    ///
    /// ST7735-class panels cannot read back over SPI, so the default is
    /// "unsupported". Drivers with a shadow framebuffer may override.
    fn read_pixel(&self, _x: i32, _y: i32) -> Option<u16> {
        None
    }
}
