//! Session calibration adjustments
//!
//! Four signed per-session offsets narrow or widen a display's published
//! usable rectangle, one per edge. They are volatile by design: committing
//! a new base configuration or resetting the protocol zeroes them.
//!
//! Screen coordinates grow rightwards and downwards, so the sign
//! convention is asymmetric: a positive top/left adjustment moves that
//! edge *outwards* by subtraction, while a positive bottom/right
//! adjustment moves outwards by addition.

use mosaic_protocol::Edge;

use super::display::{DisplayConfig, UsableArea};

/// Safety band, in pixels, around every adjusted edge
///
/// An edge may sit at most this far beyond the physical panel edge and
/// must stay at least this far from the published center.
pub const CALIBRATION_MARGIN: i32 = 10;

/// Errors from edge adjustment validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdjustError {
    /// Edge would land beyond the outer safety bound
    BeyondOuterLimit {
        /// Largest adjustment that would still be accepted
        max: i32,
    },
    /// Edge would intrude into the center safety band
    PastInnerLimit {
        /// Smallest adjustment that would still be accepted
        min: i32,
    },
}

/// The four session edge offsets, relative to the published usable area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeAdjustments {
    pub top: i8,
    pub bottom: i8,
    pub left: i8,
    pub right: i8,
}

impl EdgeAdjustments {
    pub const fn new() -> Self {
        Self {
            top: 0,
            bottom: 0,
            left: 0,
            right: 0,
        }
    }

    /// Current offset for one edge
    pub const fn get(&self, edge: Edge) -> i8 {
        match edge {
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
            Edge::Left => self.left,
            Edge::Right => self.right,
        }
    }

    /// Zero all four offsets
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Validate one edge adjustment against a display's published
    /// geometry, then apply it.
    ///
    /// Returns `Ok(true)` when the new edge sits at the outer limit (the
    /// caller surfaces a NOTICE); rejection leaves the stored offsets
    /// untouched and names the violated bound.
    pub fn try_set(
        &mut self,
        edge: Edge,
        value: i8,
        config: &DisplayConfig,
    ) -> Result<bool, AdjustError> {
        let at_outer = check_edge(edge, value, config)?;
        match edge {
            Edge::Top => self.top = value,
            Edge::Bottom => self.bottom = value,
            Edge::Left => self.left = value,
            Edge::Right => self.right = value,
        }
        Ok(at_outer)
    }

    /// Edges of the usable rectangle with these offsets applied:
    /// `(left, top, right, bottom)`, all inclusive
    pub const fn applied_to(&self, usable: &UsableArea) -> (i32, i32, i32, i32) {
        (
            usable.left() - self.left as i32,
            usable.top() - self.top as i32,
            usable.right() + self.right as i32,
            usable.bottom() + self.bottom as i32,
        )
    }

    /// Whether a point lies inside the adjusted rectangle
    pub const fn contains(&self, usable: &UsableArea, x: i32, y: i32) -> bool {
        let (left, top, right, bottom) = self.applied_to(usable);
        x >= left && x <= right && y >= top && y <= bottom
    }
}

/// Bound-check one edge without applying it
///
/// Returns whether the resulting edge sits at the outer limit.
fn check_edge(edge: Edge, value: i8, config: &DisplayConfig) -> Result<bool, AdjustError> {
    let value = value as i32;
    let usable = &config.usable;

    match edge {
        Edge::Top => {
            // Positive adjustment moves the edge UP (decreases Y)
            let new_edge = usable.top() - value;
            let outer = -CALIBRATION_MARGIN;
            let inner = config.center_y as i32 - CALIBRATION_MARGIN;

            if new_edge < outer {
                return Err(AdjustError::BeyondOuterLimit {
                    max: usable.top() - outer,
                });
            }
            if new_edge > inner {
                return Err(AdjustError::PastInnerLimit {
                    min: usable.top() - inner,
                });
            }
            Ok(new_edge <= outer)
        }
        Edge::Bottom => {
            let base = usable.bottom();
            let new_edge = base + value;
            let outer = config.height as i32 + CALIBRATION_MARGIN - 1;
            let inner = config.center_y as i32 + CALIBRATION_MARGIN;

            if new_edge > outer {
                return Err(AdjustError::BeyondOuterLimit { max: outer - base });
            }
            if new_edge < inner {
                return Err(AdjustError::PastInnerLimit { min: inner - base });
            }
            Ok(new_edge >= outer)
        }
        Edge::Left => {
            // Positive adjustment moves the edge LEFT (decreases X)
            let new_edge = usable.left() - value;
            let outer = -CALIBRATION_MARGIN;
            let inner = config.center_x as i32 - CALIBRATION_MARGIN;

            if new_edge < outer {
                return Err(AdjustError::BeyondOuterLimit {
                    max: usable.left() - outer,
                });
            }
            if new_edge > inner {
                return Err(AdjustError::PastInnerLimit {
                    min: usable.left() - inner,
                });
            }
            Ok(new_edge <= outer)
        }
        Edge::Right => {
            let base = usable.right();
            let new_edge = base + value;
            let outer = config.width as i32 + CALIBRATION_MARGIN - 1;
            let inner = config.center_x as i32 + CALIBRATION_MARGIN;

            if new_edge > outer {
                return Err(AdjustError::BeyondOuterLimit { max: outer - base });
            }
            if new_edge < inner {
                return Err(AdjustError::PastInnerLimit { min: inner - base });
            }
            Ok(new_edge >= outer)
        }
    }
}
