//! Per-display configuration
//!
//! A `DisplayConfig` pairs a panel's static identity and wiring with its
//! calibrated usable rectangle. The usable rectangle and center are the
//! *published* values: session calibration adjustments are applied on top
//! of them and never written back here.

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use mosaic_protocol::UsableAreaUpdate;

/// Maximum display name length
pub const MAX_NAME_LEN: usize = 16;

/// Maximum manufacturer/model string length
pub const MAX_LABEL_LEN: usize = 24;

/// Control pin assignment for one panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinAssignment {
    /// Chip select
    pub cs: u8,
    /// Data/command select
    pub dc: u8,
    /// Reset
    pub rst: u8,
    /// Backlight control
    pub backlight: u8,
}

/// Panel rotation, in the 0..3 convention of ST77xx-class drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    #[default]
    Portrait,
    Landscape,
    PortraitFlipped,
    LandscapeFlipped,
}

impl Rotation {
    /// Map a wire value (0..3) to a rotation
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Rotation::Portrait),
            1 => Some(Rotation::Landscape),
            2 => Some(Rotation::PortraitFlipped),
            3 => Some(Rotation::LandscapeFlipped),
            _ => None,
        }
    }

    /// Wire value of this rotation
    pub const fn index(self) -> u8 {
        match self {
            Rotation::Portrait => 0,
            Rotation::Landscape => 1,
            Rotation::PortraitFlipped => 2,
            Rotation::LandscapeFlipped => 3,
        }
    }
}

/// The calibrated sub-region of a panel guaranteed visible and undistorted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UsableArea {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl UsableArea {
    /// Leftmost usable column
    pub const fn left(&self) -> i32 {
        self.x as i32
    }

    /// Topmost usable row
    pub const fn top(&self) -> i32 {
        self.y as i32
    }

    /// Rightmost usable column, inclusive
    pub const fn right(&self) -> i32 {
        self.x as i32 + self.width as i32 - 1
    }

    /// Bottommost usable row, inclusive
    pub const fn bottom(&self) -> i32 {
        self.y as i32 + self.height as i32 - 1
    }

    /// Whether a point lies inside the rectangle
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.left() && x <= self.right() && y >= self.top() && y <= self.bottom()
    }
}

/// Errors from configuration updates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Usable rectangle edges are out of order or out of range
    InvalidUsableArea,
}

/// Static identity, wiring, and calibrated geometry of one panel
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisplayConfig {
    /// Unique display name (protocol lookup key, case-sensitive)
    pub name: String<MAX_NAME_LEN>,
    pub manufacturer: String<MAX_LABEL_LEN>,
    pub model: String<MAX_LABEL_LEN>,
    pub pins: PinAssignment,
    /// Nominal panel width after rotation
    pub width: u16,
    /// Nominal panel height after rotation
    pub height: u16,
    pub rotation: Rotation,
    /// Published usable rectangle
    pub usable: UsableArea,
    /// Published center column
    pub center_x: u16,
    /// Published center row
    pub center_y: u16,
}

impl DisplayConfig {
    /// Center of the usable rectangle, as used for bitmap centering
    pub const fn usable_center(&self) -> (i32, i32) {
        (
            self.usable.x as i32 + self.usable.width as i32 / 2,
            self.usable.y as i32 + self.usable.height as i32 / 2,
        )
    }

    /// Replace the usable rectangle and center point atomically
    ///
    /// All six fields change together or the update is rejected: edges
    /// must be ordered (`left < right`, `top < bottom`) and every value
    /// must be a representable, non-negative coordinate.
    pub fn apply_usable_area(&mut self, update: &UsableAreaUpdate) -> Result<(), ConfigError> {
        let in_range = |v: i32| v >= 0 && v <= u16::MAX as i32;

        if update.left >= update.right
            || update.top >= update.bottom
            || !in_range(update.left)
            || !in_range(update.right)
            || !in_range(update.top)
            || !in_range(update.bottom)
            || !in_range(update.center_x)
            || !in_range(update.center_y)
        {
            return Err(ConfigError::InvalidUsableArea);
        }

        self.usable = UsableArea {
            x: update.left as u16,
            y: update.top as u16,
            width: (update.right - update.left + 1) as u16,
            height: (update.bottom - update.top + 1) as u16,
        };
        self.center_x = update.center_x as u16;
        self.center_y = update.center_y as u16;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> DisplayConfig {
        DisplayConfig {
            name: String::try_from("Left").unwrap(),
            manufacturer: String::try_from("Adafruit").unwrap(),
            model: String::try_from("ST7735R").unwrap(),
            pins: PinAssignment {
                cs: 7,
                dc: 10,
                rst: 8,
                backlight: 9,
            },
            width: 160,
            height: 128,
            rotation: Rotation::Landscape,
            usable: UsableArea {
                x: 1,
                y: 2,
                width: 158,
                height: 126,
            },
            center_x: 80,
            center_y: 65,
        }
    }

    #[test]
    fn test_usable_area_edges() {
        let area = UsableArea {
            x: 1,
            y: 2,
            width: 158,
            height: 126,
        };
        assert_eq!(area.left(), 1);
        assert_eq!(area.right(), 158);
        assert_eq!(area.top(), 2);
        assert_eq!(area.bottom(), 127);

        assert!(area.contains(1, 2));
        assert!(area.contains(158, 127));
        assert!(!area.contains(0, 2));
        assert!(!area.contains(159, 127));
    }

    #[test]
    fn test_apply_usable_area() {
        let mut config = test_config();
        let update = UsableAreaUpdate {
            left: 2,
            right: 157,
            top: 3,
            bottom: 126,
            center_x: 79,
            center_y: 64,
        };

        assert!(config.apply_usable_area(&update).is_ok());
        assert_eq!(config.usable.x, 2);
        assert_eq!(config.usable.width, 156);
        assert_eq!(config.usable.y, 3);
        assert_eq!(config.usable.height, 124);
        assert_eq!(config.center_x, 79);
        assert_eq!(config.center_y, 64);
    }

    #[test]
    fn test_apply_usable_area_rejects_unordered_edges() {
        let mut config = test_config();
        let before = config.clone();

        let update = UsableAreaUpdate {
            left: 100,
            right: 50,
            top: 3,
            bottom: 126,
            center_x: 79,
            center_y: 64,
        };
        assert_eq!(
            config.apply_usable_area(&update),
            Err(ConfigError::InvalidUsableArea)
        );
        // Rejection must not partially apply
        assert_eq!(config, before);
    }

    #[test]
    fn test_apply_usable_area_rejects_negative() {
        let mut config = test_config();
        let update = UsableAreaUpdate {
            left: -1,
            right: 157,
            top: 3,
            bottom: 126,
            center_x: 79,
            center_y: 64,
        };
        assert_eq!(
            config.apply_usable_area(&update),
            Err(ConfigError::InvalidUsableArea)
        );
    }

    #[test]
    fn test_rotation_round_trip() {
        for index in 0..4u8 {
            let rotation = Rotation::from_index(index).unwrap();
            assert_eq!(rotation.index(), index);
        }
        assert_eq!(Rotation::from_index(4), None);
    }
}
