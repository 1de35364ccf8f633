//! Static display configuration table
//!
//! One entry per wired panel. Regenerate this table (and rewire `main`)
//! to change the panel set; `UPDATE_CONFIG` changes are volatile and
//! live only until power-down.

use heapless::String;

use mosaic_core::config::{DisplayConfig, PinAssignment, Rotation, UsableArea};

/// One row of the panel table
pub struct PanelDef {
    pub name: &'static str,
    pub manufacturer: &'static str,
    pub model: &'static str,
    pub cs: u8,
    pub dc: u8,
    pub rst: u8,
    pub backlight: u8,
    pub width: u16,
    pub height: u16,
    pub rotation: u8,
    /// usable x, y, width, height
    pub usable: (u16, u16, u16, u16),
    /// center x, y
    pub center: (u16, u16),
}

/// Wired panels, in registration order
///
/// Pin numbers are RP2040 GPIOs and must match the pin objects handed to
/// the drivers in `main`.
pub const PANELS: &[PanelDef] = &[
    PanelDef {
        name: "Left",
        manufacturer: "Adafruit",
        model: "ST7735R 1.8in",
        cs: 17,
        dc: 20,
        rst: 21,
        backlight: 22,
        width: 160,
        height: 128,
        rotation: 1,
        usable: (1, 2, 158, 126),
        center: (80, 65),
    },
    PanelDef {
        name: "Right",
        manufacturer: "Adafruit",
        model: "ST7735R 1.8in",
        cs: 13,
        dc: 14,
        rst: 15,
        backlight: 26,
        width: 160,
        height: 128,
        rotation: 1,
        usable: (1, 2, 158, 126),
        center: (80, 65),
    },
];

/// Build the runtime configuration for one table row
pub fn display_config(def: &PanelDef) -> DisplayConfig {
    let mut name = String::new();
    let _ = name.push_str(def.name);
    let mut manufacturer = String::new();
    let _ = manufacturer.push_str(def.manufacturer);
    let mut model = String::new();
    let _ = model.push_str(def.model);

    DisplayConfig {
        name,
        manufacturer,
        model,
        pins: PinAssignment {
            cs: def.cs,
            dc: def.dc,
            rst: def.rst,
            backlight: def.backlight,
        },
        width: def.width,
        height: def.height,
        rotation: Rotation::from_index(def.rotation).unwrap_or_default(),
        usable: UsableArea {
            x: def.usable.0,
            y: def.usable.1,
            width: def.usable.2,
            height: def.usable.3,
        },
        center_x: def.center.0,
        center_y: def.center.1,
    }
}
