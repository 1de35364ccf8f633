//! Saved pixels beneath a decorative frame
//!
//! A frame of thickness `t` occupies `t` nested one-pixel rectangle
//! outlines: layer 0 sits exactly on the adjusted usable bounds, layer k
//! one pixel further out. Capture and restore walk the footprint in the
//! same fixed order, so the buffer always matches the drawn frame
//! exactly.

use alloc::vec::Vec;

use crate::traits::PanelDriver;

/// Pixels captured from the footprint of one drawn frame
#[derive(Debug)]
pub(crate) struct FrameFootprint {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    thickness: u8,
    pixels: Vec<u16>,
}

impl FrameFootprint {
    /// Capture the footprint of a frame about to be drawn on the given
    /// layer-0 rectangle.
    ///
    /// Panels without pixel readback report `background` for every
    /// position, which matches the cleared screen a transfer starts from.
    pub fn capture<D: PanelDriver>(
        driver: &D,
        left: i32,
        top: i32,
        right: i32,
        bottom: i32,
        thickness: u8,
        background: u16,
    ) -> Self {
        let mut pixels = Vec::new();
        for_each_ring_pixel(left, top, right, bottom, thickness, |x, y| {
            pixels.push(driver.read_pixel(x, y).unwrap_or(background));
        });

        Self {
            left,
            top,
            right,
            bottom,
            thickness,
            pixels,
        }
    }

    /// Draw the captured pixels back over the footprint
    pub fn restore<D: PanelDriver>(&self, driver: &mut D) {
        let mut saved = self.pixels.iter();
        for_each_ring_pixel(
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.thickness,
            |x, y| {
                if let Some(&px) = saved.next() {
                    driver.draw_pixel(x, y, px);
                }
            },
        );
    }
}

/// Visit every pixel of a frame footprint, layer by layer
///
/// Per layer: top row, bottom row, then the side columns with corners
/// excluded. Capture and restore both rely on this order.
fn for_each_ring_pixel(
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    thickness: u8,
    mut visit: impl FnMut(i32, i32),
) {
    for layer in 0..thickness as i32 {
        let l = left - layer;
        let t = top - layer;
        let r = right + layer;
        let b = bottom + layer;

        for x in l..=r {
            visit(x, t);
            if b != t {
                visit(x, b);
            }
        }
        for y in (t + 1)..b {
            visit(l, y);
            if r != l {
                visit(r, y);
            }
        }
    }
}

/// Draw a frame as nested one-pixel rectangle outlines
pub(crate) fn draw_frame_rings<D: PanelDriver>(
    driver: &mut D,
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
    thickness: u8,
    color: u16,
) {
    for layer in 0..thickness as i32 {
        let l = left - layer;
        let t = top - layer;
        let w = (right - l + 1 + layer) as u16;
        let h = (bottom - t + 1 + layer) as u16;
        driver.draw_rect(l, t, w, h, color);
    }
}
