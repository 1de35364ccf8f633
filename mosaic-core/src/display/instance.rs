//! One physical panel and its state
//!
//! A `DisplayInstance` owns its configuration, the hardware driver, and
//! the decorative-frame state. It must be initialized before any drawing
//! is accepted; the registry constructs instances uninitialized and
//! brings them up in a separate pass.

use mosaic_protocol::UsableAreaUpdate;

use crate::color;
use crate::config::{ConfigError, DisplayConfig, EdgeAdjustments, Rotation};
use crate::traits::{PanelDriver, PanelError};

use super::frame::{draw_frame_rings, FrameFootprint};

/// Colors of the test pattern bars, left to right
const TEST_BARS: [u16; 8] = [
    color::WHITE,
    color::YELLOW,
    color::CYAN,
    color::GREEN,
    color::MAGENTA,
    color::RED,
    color::BLUE,
    color::ORANGE,
];

/// One registered panel
pub struct DisplayInstance<D> {
    config: DisplayConfig,
    driver: D,
    initialized: bool,
    frame_enabled: bool,
    frame: Option<FrameFootprint>,
}

impl<D: PanelDriver> DisplayInstance<D> {
    pub fn new(config: DisplayConfig, driver: D) -> Self {
        Self {
            config,
            driver,
            initialized: false,
            frame_enabled: false,
            frame: None,
        }
    }

    /// Display name (protocol lookup key)
    pub fn name(&self) -> &str {
        self.config.name.as_str()
    }

    pub fn config(&self) -> &DisplayConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Bring the panel up: hardware init, rotation, cleared screen
    pub fn init(&mut self) -> Result<(), PanelError> {
        self.driver.init()?;
        self.driver.set_rotation(self.config.rotation);
        self.driver.fill_screen(color::BLACK);
        self.initialized = true;
        Ok(())
    }

    /// Clear the panel to black
    pub fn clear(&mut self) {
        self.driver.fill_screen(color::BLACK);
    }

    pub fn fill_screen(&mut self, color: u16) {
        self.driver.fill_screen(color);
    }

    pub fn draw_pixel(&mut self, x: i32, y: i32, color: u16) {
        self.driver.draw_pixel(x, y, color);
    }

    /// Rotate the panel and record the new orientation
    pub fn set_rotation(&mut self, rotation: Rotation) {
        self.driver.set_rotation(rotation);
        self.config.rotation = rotation;
    }

    /// Replace the published usable rectangle and center atomically
    pub fn commit_usable_area(&mut self, update: &UsableAreaUpdate) -> Result<(), ConfigError> {
        self.config.apply_usable_area(update)
    }

    /// Whether a point lies inside the published usable rectangle
    pub fn is_within_bounds(&self, x: i32, y: i32) -> bool {
        self.config.usable.contains(x, y)
    }

    /// Whether a point lies inside the usable rectangle as narrowed or
    /// widened by the session adjustments
    ///
    /// This is the authoritative clip test while streaming bitmap pixels,
    /// independent of whether the decorative frame is visible.
    pub fn is_within_frame_bounds(&self, x: i32, y: i32, adjust: &EdgeAdjustments) -> bool {
        adjust.contains(&self.config.usable, x, y)
    }

    /// Draw the decorative frame over the adjusted usable bounds
    ///
    /// The pixels under the footprint are captured first so the frame can
    /// be cleared non-destructively; a previous capture is dropped.
    pub fn draw_image_frame(&mut self, color: u16, thickness: u8, adjust: &EdgeAdjustments) {
        let (left, top, right, bottom) = adjust.applied_to(&self.config.usable);

        self.frame = None;
        self.frame = Some(FrameFootprint::capture(
            &self.driver,
            left,
            top,
            right,
            bottom,
            thickness,
            color::BLACK,
        ));

        draw_frame_rings(&mut self.driver, left, top, right, bottom, thickness, color);
        self.frame_enabled = true;
    }

    /// Restore the pixels under the frame and drop the capture
    ///
    /// No-op when no frame is held.
    pub fn clear_image_frame(&mut self) {
        if let Some(footprint) = self.frame.take() {
            footprint.restore(&mut self.driver);
        }
        self.frame_enabled = false;
    }

    /// Draw or clear the frame according to `enable`
    pub fn enable_image_frame(
        &mut self,
        enable: bool,
        color: u16,
        thickness: u8,
        adjust: &EdgeAdjustments,
    ) {
        if enable {
            self.draw_image_frame(color, thickness, adjust);
        } else {
            self.clear_image_frame();
        }
    }

    pub fn is_image_frame_enabled(&self) -> bool {
        self.frame_enabled
    }

    /// Live calibration preview: draw the frame immediately
    pub fn draw_calibration_frame(&mut self, adjust: &EdgeAdjustments, color: u16, thickness: u8) {
        self.draw_image_frame(color, thickness, adjust);
    }

    /// Color bars across the usable area, its outline, and a center cross
    pub fn show_test_pattern(&mut self) {
        let usable = self.config.usable;
        self.driver.fill_screen(color::BLACK);

        let bar_width = (usable.width as i32 / TEST_BARS.len() as i32).max(1);
        for (i, &bar) in TEST_BARS.iter().enumerate() {
            let start = usable.left() + i as i32 * bar_width;
            let end = (start + bar_width).min(usable.right() + 1);
            for x in start..end {
                self.driver
                    .draw_line(x, usable.top(), x, usable.bottom(), bar);
            }
        }

        // Usable-area outline and center cross, as in calibration
        self.driver.draw_rect(
            usable.left(),
            usable.top(),
            usable.width,
            usable.height,
            color::GREEN,
        );
        let cx = self.config.center_x as i32;
        let cy = self.config.center_y as i32;
        self.driver.draw_line(cx - 5, cy, cx + 5, cy, color::RED);
        self.driver.draw_line(cx, cy - 5, cx, cy + 5, color::RED);
    }

    /// Error indication: the message itself goes to the serial peer
    pub fn show_error_screen(&mut self) {
        self.driver.fill_screen(color::RED);
    }

    /// Direct access to the underlying panel driver
    pub fn driver(&self) -> &D {
        &self.driver
    }
}
