//! Rectangular pixel snapshots
//!
//! Captures a rectangular block of RGB565 pixels into one heap
//! allocation and restores it to a panel later. The store holds at most
//! one snapshot; capturing a new one supersedes the old only after the
//! new allocation has succeeded, so a failed capture never loses the
//! previous snapshot.

use alloc::vec::Vec;

use crate::traits::PanelDriver;

/// Upper bound on one snapshot allocation (header + pixels), in bytes
///
/// Keeps a single capture from exhausting the small heap of the target
/// board.
pub const SNAPSHOT_MAX_BYTES: usize = 60 * 1024;

/// Geometry of a stored snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SnapshotHeader {
    /// Captured width in pixels
    pub width: u16,
    /// Captured height in pixels
    pub height: u16,
    /// Panel column the block was captured from / restores to
    pub offset_x: i16,
    /// Panel row the block was captured from / restores to
    pub offset_y: i16,
}

#[derive(Debug)]
struct Snapshot {
    header: SnapshotHeader,
    /// Row-major RGB565 pixel values, `width * height` of them
    pixels: Vec<u16>,
}

/// Holds at most one pixel snapshot at a time
///
/// Owned by whatever composes the engine and drivers, and passed by
/// reference where needed; there is deliberately no global instance.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    slot: Option<Snapshot>,
}

impl SnapshotStore {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Whether a snapshot is currently stored
    pub fn has_snapshot(&self) -> bool {
        self.slot.is_some()
    }

    /// Geometry of the stored snapshot, if any
    pub fn header(&self) -> Option<&SnapshotHeader> {
        self.slot.as_ref().map(|s| &s.header)
    }

    /// Capture pixels from an in-memory buffer (row-major RGB565)
    ///
    /// `src` must hold at least `width * height` values. Zero dimensions,
    /// a short source, and captures past [`SNAPSHOT_MAX_BYTES`] are
    /// rejected. On any failure, including allocation failure, the
    /// previously stored snapshot is left untouched.
    pub fn capture_from_buffer(
        &mut self,
        src: &[u16],
        width: u16,
        height: u16,
        offset_x: i16,
        offset_y: i16,
    ) -> bool {
        if width == 0 || height == 0 {
            return false;
        }

        let pixel_count = width as usize * height as usize;
        if src.len() < pixel_count {
            return false;
        }

        let bytes_needed =
            core::mem::size_of::<SnapshotHeader>() + pixel_count * core::mem::size_of::<u16>();
        if bytes_needed > SNAPSHOT_MAX_BYTES {
            return false;
        }

        let mut pixels = Vec::new();
        if pixels.try_reserve_exact(pixel_count).is_err() {
            return false;
        }
        pixels.extend_from_slice(&src[..pixel_count]);

        // Only now supersede the previous snapshot
        self.slot = Some(Snapshot {
            header: SnapshotHeader {
                width,
                height,
                offset_x,
                offset_y,
            },
            pixels,
        });
        true
    }

    /// Capture pixels directly from a panel
    ///
    /// ST7735-class panels cannot read their pixel memory back, so this
    /// always fails; callers capture from a buffer they control instead.
    pub fn capture_from_display<D: PanelDriver>(
        &mut self,
        _driver: &D,
        _x: u16,
        _y: u16,
        _width: u16,
        _height: u16,
    ) -> bool {
        false
    }

    /// Redraw the stored snapshot at its original offset
    ///
    /// Pixels falling outside the panel's current bounds are skipped
    /// silently. Non-destructive: the snapshot stays stored and may be
    /// restored again.
    pub fn restore_to_display<D: PanelDriver>(&self, driver: &mut D) -> bool {
        let Some(snapshot) = self.slot.as_ref() else {
            return false;
        };

        let hdr = &snapshot.header;
        let panel_width = driver.width() as i32;
        let panel_height = driver.height() as i32;

        for row in 0..hdr.height as usize {
            for col in 0..hdr.width as usize {
                let x = hdr.offset_x as i32 + col as i32;
                let y = hdr.offset_y as i32 + row as i32;
                if x >= 0 && x < panel_width && y >= 0 && y < panel_height {
                    if let Some(&px) = snapshot.pixels.get(row * hdr.width as usize + col) {
                        driver.draw_pixel(x, y, px);
                    }
                }
            }
        }
        true
    }

    /// Free the stored snapshot; safe to call when none exists
    pub fn discard(&mut self) {
        self.slot = None;
    }
}
