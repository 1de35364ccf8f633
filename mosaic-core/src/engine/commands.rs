//! Menu command execution
//!
//! `CMD:`-prefixed commands are state-independent: they run in every
//! line-reading state and never advance the transfer machine, `RESET`
//! excepted. Each failure is one `ERROR:` line; a rejected command never
//! partially applies.

use mosaic_protocol::{Edge, MenuCommand, UsableAreaUpdate};

use crate::config::{Rotation, CALIBRATION_MARGIN};
use crate::traits::{PanelDriver, SerialPort};

use super::{reply, PortWriter, ProtocolEngine};

impl<D: PanelDriver, S: SerialPort> ProtocolEngine<'_, D, S> {
    pub(super) fn handle_menu_command(&mut self, command: MenuCommand) {
        match command {
            MenuCommand::Reset => {
                self.reset();
                self.port.write_line("OK:Protocol reset");
            }
            MenuCommand::List => self.cmd_list(),
            MenuCommand::Info => self.cmd_info(),
            MenuCommand::Test => self.cmd_test(),
            MenuCommand::TestAll => self.cmd_test_all(),
            MenuCommand::FrameOn => self.cmd_frame_enable(true),
            MenuCommand::FrameOff => self.cmd_frame_enable(false),
            MenuCommand::FrameColor(color) => self.cmd_frame_color(color),
            MenuCommand::FrameThickness(thickness) => self.cmd_frame_thickness(thickness),
            MenuCommand::Adjust { edge, value } => self.cmd_adjust(edge, value),
            MenuCommand::Calibrate => self.cmd_calibrate(),
            MenuCommand::UpdateConfig(update) => self.cmd_update_config(update),
            MenuCommand::Orientation(rotation) => self.cmd_orientation(rotation),
            MenuCommand::Help => self.cmd_help(),
        }
    }

    /// Emit the shared no-active-display error; returns the index when
    /// one is selected
    fn require_active(&mut self) -> Option<usize> {
        if self.active.is_none() {
            self.port.write_line("ERROR:No active display selected");
        }
        self.active
    }

    fn cmd_list(&mut self) {
        self.port.write_line("OK:DISPLAY_LIST");
        reply(&mut self.port, format_args!("Count:{}", self.registry.len()));
        let _ = self.registry.list(&mut PortWriter(&mut self.port));
        self.port.write_line("END_LIST");
    }

    fn cmd_info(&mut self) {
        let Some(index) = self.require_active() else {
            return;
        };
        let Some(display) = self.registry.get_by_index(index) else {
            return;
        };
        let cfg = display.config();

        self.port.write_line("OK:DISPLAY_INFO");
        reply(&mut self.port, format_args!("Name:{}", cfg.name.as_str()));
        reply(
            &mut self.port,
            format_args!("Resolution:{}x{}", cfg.usable.width, cfg.usable.height),
        );
        reply(
            &mut self.port,
            format_args!("Rotation:{}", cfg.rotation.index()),
        );
        reply(
            &mut self.port,
            format_args!(
                "FrameEnabled:{}",
                if self.frame.enabled { "Yes" } else { "No" }
            ),
        );
        reply(&mut self.port, format_args!("FrameColor:{}", self.frame.color));
        reply(
            &mut self.port,
            format_args!("FrameThickness:{}", self.frame.thickness),
        );
        reply(
            &mut self.port,
            format_args!("UsableAreaAdjustTop:{}", self.adjust.top),
        );
        reply(
            &mut self.port,
            format_args!("UsableAreaAdjustBottom:{}", self.adjust.bottom),
        );
        reply(
            &mut self.port,
            format_args!("UsableAreaAdjustLeft:{}", self.adjust.left),
        );
        reply(
            &mut self.port,
            format_args!("UsableAreaAdjustRight:{}", self.adjust.right),
        );
        reply(&mut self.port, format_args!("CenterX:{}", cfg.center_x));
        reply(&mut self.port, format_args!("CenterY:{}", cfg.center_y));
        self.port.write_line("END_INFO");
    }

    fn cmd_test(&mut self) {
        let Some(index) = self.require_active() else {
            return;
        };
        let Some(display) = self.registry.get_by_index_mut(index) else {
            return;
        };

        reply(
            &mut self.port,
            format_args!("OK:Testing display {}", display.name()),
        );
        display.show_test_pattern();
        self.port.write_line("Test pattern displayed");
    }

    fn cmd_test_all(&mut self) {
        self.port.write_line("OK:Testing all displays");
        self.registry.show_all_test_patterns();
        self.port.write_line("All test patterns displayed");
    }

    fn cmd_frame_enable(&mut self, enable: bool) {
        let Some(index) = self.require_active() else {
            return;
        };
        let Some(display) = self.registry.get_by_index_mut(index) else {
            return;
        };

        display.enable_image_frame(enable, self.frame.color, self.frame.thickness, &self.adjust);
        self.frame.enabled = enable;
        if enable {
            self.port.write_line("OK:Frame enabled");
        } else {
            self.port.write_line("OK:Frame disabled");
        }
    }

    fn cmd_frame_color(&mut self, color: u16) {
        let Some(index) = self.require_active() else {
            return;
        };
        let Some(display) = self.registry.get_by_index_mut(index) else {
            return;
        };

        self.frame.color = color;
        self.frame.enabled = true;
        reply(
            &mut self.port,
            format_args!("OK:Frame color set to {}", color),
        );

        // Show the new color immediately
        display.draw_calibration_frame(&self.adjust, color, self.frame.thickness);
    }

    fn cmd_frame_thickness(&mut self, thickness: i32) {
        let Some(index) = self.require_active() else {
            return;
        };

        if !(1..=10).contains(&thickness) {
            self.port.write_line("ERROR:Thickness must be between 1 and 10");
            return;
        }
        let Some(display) = self.registry.get_by_index_mut(index) else {
            return;
        };

        self.frame.thickness = thickness as u8;
        self.frame.enabled = true;
        reply(
            &mut self.port,
            format_args!("OK:Frame thickness set to {}", thickness),
        );

        display.draw_calibration_frame(&self.adjust, self.frame.color, self.frame.thickness);
    }

    fn cmd_adjust(&mut self, edge: Edge, value: i8) {
        use crate::config::AdjustError;

        let Some(index) = self.require_active() else {
            return;
        };
        let Some(display) = self.registry.get_by_index_mut(index) else {
            return;
        };

        match self.adjust.try_set(edge, value, display.config()) {
            Ok(at_outer_limit) => {
                reply(
                    &mut self.port,
                    format_args!("OK:{} edge adjusted to {}", edge.name(), value),
                );

                if at_outer_limit {
                    match edge {
                        Edge::Top | Edge::Left => reply(
                            &mut self.port,
                            format_args!(
                                "NOTICE:{} edge at maximum outward position (-{} pixels beyond display)",
                                edge.name(),
                                CALIBRATION_MARGIN
                            ),
                        ),
                        Edge::Bottom => reply(
                            &mut self.port,
                            format_args!(
                                "NOTICE:Bottom edge at maximum outward position ({} pixels, {} beyond display)",
                                display.config().height as i32 + CALIBRATION_MARGIN - 1,
                                CALIBRATION_MARGIN
                            ),
                        ),
                        Edge::Right => reply(
                            &mut self.port,
                            format_args!(
                                "NOTICE:Right edge at maximum outward position ({} pixels, {} beyond display)",
                                display.config().width as i32 + CALIBRATION_MARGIN - 1,
                                CALIBRATION_MARGIN
                            ),
                        ),
                    }
                }

                // Live preview at the new position
                display.draw_calibration_frame(&self.adjust, self.frame.color, self.frame.thickness);
            }
            Err(AdjustError::BeyondOuterLimit { max }) => reply(
                &mut self.port,
                format_args!(
                    "ERROR:{} edge would be beyond limit (maximum adjustment: {})",
                    edge.name(),
                    max
                ),
            ),
            Err(AdjustError::PastInnerLimit { min }) => {
                let sign = match edge {
                    Edge::Top | Edge::Left => '-',
                    Edge::Bottom | Edge::Right => '+',
                };
                reply(
                    &mut self.port,
                    format_args!(
                        "ERROR:{} edge would be past center{}{} (minimum adjustment: {})",
                        edge.name(),
                        sign,
                        CALIBRATION_MARGIN,
                        min
                    ),
                );
            }
        }
    }

    fn cmd_calibrate(&mut self) {
        let Some(index) = self.require_active() else {
            return;
        };
        let Some(display) = self.registry.get_by_index_mut(index) else {
            return;
        };

        reply(
            &mut self.port,
            format_args!("OK:Showing calibration pattern on {}", display.name()),
        );
        display.draw_calibration_frame(&self.adjust, self.frame.color, self.frame.thickness);
        self.port.write_line("Calibration pattern displayed");
    }

    fn cmd_update_config(&mut self, update: UsableAreaUpdate) {
        let Some(index) = self.require_active() else {
            return;
        };
        let Some(display) = self.registry.get_by_index_mut(index) else {
            return;
        };

        if display.commit_usable_area(&update).is_err() {
            self.port
                .write_line("ERROR:Invalid usable area: expected left<right and top<bottom");
            return;
        }

        // Committing a new base configuration starts a clean session
        self.adjust.reset();

        self.port.write_line("OK:Base configuration updated");
        let cfg = display.config();
        reply(
            &mut self.port,
            format_args!(
                "New usable area: {},{},{},{}",
                cfg.usable.left(),
                cfg.usable.right(),
                cfg.usable.top(),
                cfg.usable.bottom()
            ),
        );
        reply(
            &mut self.port,
            format_args!("New center: {},{}", cfg.center_x, cfg.center_y),
        );
        self.port
            .write_line("NOTE:Changes lost on power cycle - update the display config table for permanent storage");
    }

    fn cmd_orientation(&mut self, rotation: i32) {
        let Some(index) = self.require_active() else {
            return;
        };

        let Some(rotation_value) = u8::try_from(rotation).ok().and_then(Rotation::from_index)
        else {
            self.port.write_line(
                "ERROR:Invalid orientation. Use 0-3 (0=Portrait, 1=Landscape, 2=Reverse Portrait, 3=Reverse Landscape)",
            );
            return;
        };

        let Some(display) = self.registry.get_by_index_mut(index) else {
            return;
        };
        if !display.is_initialized() {
            self.port.write_line("ERROR:Display not initialized");
            return;
        }

        display.set_rotation(rotation_value);
        reply(
            &mut self.port,
            format_args!("OK:Orientation set to {}", rotation),
        );
    }

    fn cmd_help(&mut self) {
        self.port.write_line("OK:HELP");
        self.port.write_line("Available CMD: commands:");
        self.port.write_line("  CMD:LIST - List all displays");
        self.port.write_line("  CMD:INFO - Show active display info");
        self.port.write_line("  CMD:TEST - Test active display");
        self.port.write_line("  CMD:TEST_ALL - Test all displays");
        self.port.write_line("  CMD:FRAME_ON - Enable frame");
        self.port.write_line("  CMD:FRAME_OFF - Disable frame");
        self.port
            .write_line("  CMD:FRAME_COLOR:value - Set frame color (0-65535)");
        self.port
            .write_line("  CMD:FRAME_THICKNESS:value - Set thickness (1-10)");
        self.port
            .write_line("  CMD:ADJUST_TOP:value - Adjust top edge (relative to config)");
        self.port
            .write_line("  CMD:ADJUST_BOTTOM:value - Adjust bottom edge");
        self.port.write_line("  CMD:ADJUST_LEFT:value - Adjust left edge");
        self.port
            .write_line("  CMD:ADJUST_RIGHT:value - Adjust right edge");
        self.port
            .write_line("  CMD:CALIBRATE - Show calibration pattern");
        self.port.write_line(
            "  CMD:UPDATE_CONFIG:left,right,top,bottom,centerX,centerY - Update base config",
        );
        self.port.write_line(
            "  CMD:ORIENTATION:value - Set rotation (0=Portrait, 1=Landscape, 2=Rev Portrait, 3=Rev Landscape)",
        );
        self.port.write_line("  CMD:HELP - Show this help");
        self.port.write_line("");
        self.port.write_line("Bitmap protocol commands:");
        self.port
            .write_line("  DISPLAY:<name> - Select display for bitmap");
        self.port.write_line("  BMPStart - Start bitmap transfer");
        self.port
            .write_line("  SIZE:width,height - Set bitmap dimensions");
        self.port.write_line("  <pixel data> - Send RGB565 pixel data");
        self.port.write_line("  BMPEnd - End bitmap transfer");
        self.port.write_line("END_HELP");
    }
}
