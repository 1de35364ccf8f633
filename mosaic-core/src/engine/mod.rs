//! Serial protocol engine
//!
//! The top-level state machine. It is polled from the board's main loop:
//! every `process()` call performs at most one bounded unit of work (one
//! dispatched command line, or the pixel bytes currently buffered) and
//! returns. A separately polled `check_timeout()` keeps an abandoned
//! transfer from wedging a panel in a partial-image state.
//!
//! The engine borrows the registry for its lifetime and addresses the
//! active display by index; it never owns a display. Timestamps are
//! supplied by the caller in milliseconds, so the engine carries no clock
//! dependency of its own.

mod commands;

use core::fmt::{self, Write};

use heapless::String;

use mosaic_protocol::{Command, FrameSetting, LineError, LineReader, ParseError};

use crate::color;
use crate::config::EdgeAdjustments;
use crate::display::{DisplayInstance, DisplayRegistry};
use crate::traits::{PanelDriver, SerialPort};

/// Inactivity bound for an in-flight transfer
pub const TIMEOUT_MS: u64 = 15_000;

/// Idle prompt interval while waiting for a display selection
pub const SELECT_PROMPT_MS: u64 = 3_000;

/// Hard cap on either bitmap dimension
pub const MAX_DIMENSION: i32 = 1000;

/// Report transfer progress every this many completed rows
const PROGRESS_REPORT_INTERVAL: i32 = 10;

/// Protocol states, in transfer order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProtocolState {
    /// Waiting for `DISPLAY:<name>`; menu commands always accepted
    SelectDisplay,
    /// Display selected, waiting for `BMPStart`
    AwaitStart,
    /// Waiting for `SIZE:<w>,<h>`
    AwaitSize,
    /// Consuming the raw pixel stream
    ReceivingData,
    /// All pixels consumed, waiting for `BMPEnd`
    AwaitEnd,
    /// Transfer done; auto-advances back to `AwaitStart`
    Complete,
}

impl ProtocolState {
    /// Whether the inactivity timeout applies in this state
    ///
    /// Selection and idle states give the user unlimited time to pick a
    /// display and browse for files.
    const fn times_out(self) -> bool {
        matches!(
            self,
            ProtocolState::AwaitSize
                | ProtocolState::ReceivingData
                | ProtocolState::AwaitEnd
                | ProtocolState::Complete
        )
    }
}

/// In-flight bitmap geometry and cursor
#[derive(Debug, Default)]
struct Transfer {
    width: i32,
    height: i32,
    row: i32,
    col: i32,
    offset_x: i32,
    offset_y: i32,
    /// High byte of a pixel whose low byte has not arrived yet
    pending_high: Option<u8>,
}

impl Transfer {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Session image-frame defaults, applied when a transfer completes
#[derive(Debug, Clone, Copy)]
struct FrameDefaults {
    enabled: bool,
    color: u16,
    thickness: u8,
}

impl Default for FrameDefaults {
    fn default() -> Self {
        Self {
            enabled: true,
            color: color::WHITE,
            thickness: 1,
        }
    }
}

/// The serial protocol engine
pub struct ProtocolEngine<'a, D, S> {
    registry: &'a mut DisplayRegistry<D>,
    port: S,
    state: ProtocolState,
    /// Active display as a registry index; never an owning reference
    active: Option<usize>,
    transfer: Transfer,
    line: LineReader,
    frame: FrameDefaults,
    adjust: EdgeAdjustments,
    last_activity: u64,
}

impl<'a, D: PanelDriver, S: SerialPort> ProtocolEngine<'a, D, S> {
    pub fn new(registry: &'a mut DisplayRegistry<D>, port: S) -> Self {
        Self {
            registry,
            port,
            state: ProtocolState::SelectDisplay,
            active: None,
            transfer: Transfer::default(),
            line: LineReader::new(),
            frame: FrameDefaults::default(),
            adjust: EdgeAdjustments::new(),
            last_activity: 0,
        }
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// The currently selected display, if any
    pub fn active_display(&self) -> Option<&DisplayInstance<D>> {
        self.active.and_then(|i| self.registry.get_by_index(i))
    }

    /// Session calibration adjustments
    pub fn adjustments(&self) -> &EdgeAdjustments {
        &self.adjust
    }

    pub fn image_frame_enabled(&self) -> bool {
        self.frame.enabled
    }

    /// Override the session image-frame defaults
    pub fn set_image_frame(&mut self, enabled: bool, color: u16, thickness: u8) {
        self.frame = FrameDefaults {
            enabled,
            color,
            thickness,
        };
    }

    pub fn port(&self) -> &S {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut S {
        &mut self.port
    }

    /// Perform one unit of protocol work
    ///
    /// `now` is the caller's millisecond clock; it only needs to be
    /// monotonic.
    pub fn process(&mut self, now: u64) {
        if self.state == ProtocolState::Complete {
            self.finish_transfer();
            return;
        }

        let Some(first) = self.port.read_byte() else {
            // Nothing buffered. While idle in selection, periodically
            // remind an interactive user that the system is ready.
            if self.state == ProtocolState::SelectDisplay
                && now.saturating_sub(self.last_activity) >= SELECT_PROMPT_MS
            {
                self.port.write_line("Ready for next bitmap");
                self.last_activity = now;
            }
            return;
        };

        self.last_activity = now;

        if self.state == ProtocolState::ReceivingData {
            self.receive_pixel_bytes(first);
            return;
        }

        // Line-oriented states: accumulate until one full line, dispatch
        // it, and yield.
        let mut byte = first;
        loop {
            match self.line.feed(byte) {
                Ok(Some(line)) => {
                    self.dispatch_line(line.as_str());
                    return;
                }
                Ok(None) => {}
                Err(err) => {
                    self.report_line_error(err);
                    return;
                }
            }
            byte = match self.port.read_byte() {
                Some(b) => b,
                None => return,
            };
        }
    }

    /// Enforce the transfer liveness bound
    ///
    /// Invoked independently of `process()`. If a transfer state has seen
    /// no activity for [`TIMEOUT_MS`], the engine force-resets and paints
    /// the error screen.
    pub fn check_timeout(&mut self, now: u64) {
        if self.state.times_out() && now.saturating_sub(self.last_activity) > TIMEOUT_MS {
            self.abort_transfer("Timeout waiting for data");
            self.port.write_line("Timeout - resetting protocol");
            self.last_activity = now;
        }
    }

    /// Return to the initial state
    ///
    /// Clears the machine state, the active display, the in-flight
    /// transfer, and the session calibration adjustments. The image-frame
    /// defaults are operator preferences and survive.
    pub fn reset(&mut self) {
        self.state = ProtocolState::SelectDisplay;
        self.active = None;
        self.transfer.clear();
        self.adjust.reset();
        self.line.clear();
    }

    fn dispatch_line(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }

        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(err) => {
                self.report_parse_error(line, err);
                return;
            }
        };

        match command {
            Command::Menu(menu) => self.handle_menu_command(menu),
            Command::Reset => {
                self.reset();
                self.port.write_line("Protocol reset");
            }
            Command::Frame(setting) if self.state == ProtocolState::SelectDisplay => {
                self.handle_frame_setting(setting)
            }
            Command::SelectDisplay(name) if self.state == ProtocolState::SelectDisplay => {
                self.handle_display_select(name)
            }
            Command::BmpStart if self.state == ProtocolState::AwaitStart => {
                self.port.write_line("Start marker received");
                self.state = ProtocolState::AwaitSize;
            }
            Command::Size { width, height } if self.state == ProtocolState::AwaitSize => {
                self.handle_size(width, height)
            }
            Command::BmpEnd if self.state == ProtocolState::AwaitEnd => self.handle_end(),
            _ => self.report_unexpected(line),
        }
    }

    fn handle_frame_setting(&mut self, setting: FrameSetting) {
        match setting {
            FrameSetting::On => {
                self.frame.enabled = true;
                self.port.write_line("Frame enabled");
            }
            FrameSetting::Off => {
                self.frame.enabled = false;
                self.port.write_line("Frame disabled");
            }
            FrameSetting::Color(value) => {
                self.frame.color = value;
                reply(&mut self.port, format_args!("Frame color set to: {}", value));
            }
            FrameSetting::Thickness(value) => {
                if !(1..=10).contains(&value) {
                    self.port.write_line("ERROR:Thickness must be between 1 and 10");
                    return;
                }
                self.frame.thickness = value as u8;
                reply(
                    &mut self.port,
                    format_args!("Frame thickness set to: {}", value),
                );
            }
        }
    }

    fn handle_display_select(&mut self, name: &str) {
        match self.registry.index_of(name) {
            Some(index) => {
                if let Some(display) = self.registry.get_by_index(index) {
                    if !display.is_initialized() {
                        reply(
                            &mut self.port,
                            format_args!("ERROR: Display not initialized: {}", name),
                        );
                        return;
                    }
                }
                self.active = Some(index);
                reply(&mut self.port, format_args!("DISPLAY_READY:{}", name));
                self.state = ProtocolState::AwaitStart;
            }
            None => {
                reply(
                    &mut self.port,
                    format_args!("ERROR: Display not found: {}", name),
                );
            }
        }
    }

    fn handle_size(&mut self, width: i32, height: i32) {
        let Some(index) = self.active else {
            self.port.write_line("ERROR:No active display selected");
            return;
        };
        let Some(display) = self.registry.get_by_index_mut(index) else {
            self.port.write_line("ERROR:No active display selected");
            return;
        };

        // Dimension validation
        if width <= 0 || height <= 0 {
            reply(
                &mut self.port,
                format_args!("ERROR:Invalid dimensions: width={}, height={}", width, height),
            );
            return;
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            reply(
                &mut self.port,
                format_args!("ERROR:Dimensions too large: width={}, height={}", width, height),
            );
            return;
        }
        let usable = display.config().usable;
        if width > usable.width as i32 {
            reply(
                &mut self.port,
                format_args!("ERROR:Width {} exceeds usable width {}", width, usable.width),
            );
            return;
        }
        if height > usable.height as i32 {
            reply(
                &mut self.port,
                format_args!(
                    "ERROR:Height {} exceeds usable height {}",
                    height, usable.height
                ),
            );
            return;
        }
        reply(
            &mut self.port,
            format_args!("Dimensions validated: {}x{}", width, height),
        );

        // Center the bitmap on the usable rectangle; both corners of the
        // placement must stay within the published bounds.
        let (center_x, center_y) = display.config().usable_center();
        let offset_x = center_x - width / 2;
        let offset_y = center_y - height / 2;

        if !display.is_within_bounds(offset_x, offset_y)
            || !display.is_within_bounds(offset_x + width - 1, offset_y + height - 1)
        {
            self.port
                .write_line("ERROR:Calculated bitmap position exceeds bounds");
            return;
        }
        reply(
            &mut self.port,
            format_args!("Centering at offset: ({}, {})", offset_x, offset_y),
        );

        // Clear the panel before inviting the pixel stream
        self.port.write_line("Clearing display...");
        display.clear();

        self.port.write_line("READY");
        reply(
            &mut self.port,
            format_args!("Receiving bitmap: {}x{}", width, height),
        );

        self.transfer = Transfer {
            width,
            height,
            row: 0,
            col: 0,
            offset_x,
            offset_y,
            pending_high: None,
        };
        self.state = ProtocolState::ReceivingData;

        reply(
            &mut self.port,
            format_args!("Ready to receive {} pixels", width * height),
        );
    }

    /// Consume buffered pixel bytes, two per RGB565 value
    fn receive_pixel_bytes(&mut self, first: u8) {
        let mut byte = Some(first);
        while let Some(b) = byte {
            match self.transfer.pending_high.take() {
                None => self.transfer.pending_high = Some(b),
                Some(high) => {
                    let pixel = u16::from_be_bytes([high, b]);
                    self.draw_bitmap_pixel(pixel);
                    if self.state != ProtocolState::ReceivingData {
                        // Row count reached; remaining bytes are the end
                        // marker line, handled on the next poll
                        return;
                    }
                }
            }
            byte = self.port.read_byte();
        }
    }

    fn draw_bitmap_pixel(&mut self, pixel: u16) {
        let x = self.transfer.col + self.transfer.offset_x;
        let y = self.transfer.row + self.transfer.offset_y;

        // The adjusted frame bounds crop the stream whether or not the
        // decorative frame is visible
        if let Some(display) = self.active.and_then(|i| self.registry.get_by_index_mut(i)) {
            if display.is_within_frame_bounds(x, y, &self.adjust) {
                display.draw_pixel(x, y, pixel);
            }
        }

        self.transfer.col += 1;
        if self.transfer.col >= self.transfer.width {
            self.transfer.col = 0;
            self.transfer.row += 1;

            if self.transfer.row >= self.transfer.height {
                self.state = ProtocolState::AwaitEnd;
            } else if self.transfer.row % PROGRESS_REPORT_INTERVAL == 0 {
                let tenths = self.transfer.row * 1000 / self.transfer.height;
                reply(
                    &mut self.port,
                    format_args!(
                        "Progress: {}.{}% (Row {}/{})",
                        tenths / 10,
                        tenths % 10,
                        self.transfer.row,
                        self.transfer.height
                    ),
                );
            }
        }
    }

    fn handle_end(&mut self) {
        if self.frame.enabled {
            if let Some(display) = self.active.and_then(|i| self.registry.get_by_index_mut(i)) {
                display.draw_image_frame(self.frame.color, self.frame.thickness, &self.adjust);
            }
        }

        self.state = ProtocolState::Complete;
        self.port.write_line("COMPLETE");
        self.port.write_line("Bitmap display completed successfully!");
    }

    /// Complete state: clear transfer counters and re-arm for the next
    /// bitmap on the already-selected display
    fn finish_transfer(&mut self) {
        self.state = ProtocolState::AwaitStart;
        self.transfer.clear();
        self.port.write_line("Ready for next bitmap");
    }

    /// Abort an active transfer: report, paint the error screen, reset
    fn abort_transfer(&mut self, message: &str) {
        reply(&mut self.port, format_args!("ERROR: {}", message));
        if let Some(display) = self.active.and_then(|i| self.registry.get_by_index_mut(i)) {
            display.show_error_screen();
        }
        self.reset();
    }

    fn report_line_error(&mut self, err: LineError) {
        match err {
            LineError::TooLong => self.port.write_line("ERROR:Command line too long"),
            LineError::InvalidUtf8 => self.port.write_line("ERROR:Malformed command line"),
        }
    }

    fn report_parse_error(&mut self, line: &str, err: ParseError) {
        match err {
            ParseError::UnknownCommand => {
                if let Some(cmd) = line.strip_prefix("CMD:") {
                    reply(&mut self.port, format_args!("ERROR:Unknown command: {}", cmd));
                } else {
                    self.report_unexpected(line);
                }
            }
            ParseError::InvalidValue => {
                reply(
                    &mut self.port,
                    format_args!("ERROR:Invalid value in command: {}", line),
                );
            }
            ParseError::WrongParameterCount(count) if count > 6 => {
                self.port.write_line("ERROR:Too many parameters");
            }
            ParseError::WrongParameterCount(_) => {
                self.port
                    .write_line("ERROR:Expected 6 parameters (left,right,top,bottom,centerX,centerY)");
            }
            ParseError::InvalidSizeFormat => {
                self.port.write_line("ERROR:Invalid size format");
            }
        }
    }

    /// A recognized or unrecognized line that the current state cannot
    /// use: reported, state unchanged
    fn report_unexpected(&mut self, line: &str) {
        match self.state {
            ProtocolState::SelectDisplay => match Command::parse(line) {
                Ok(_) => {
                    self.port
                        .write_line("ERROR:Select a display first with DISPLAY:<name>");
                }
                Err(_) => {
                    reply(&mut self.port, format_args!("ERROR:Unknown command: {}", line));
                }
            },
            ProtocolState::AwaitStart => {
                reply(
                    &mut self.port,
                    format_args!("ERROR:Expected BMPStart, got: {}", line),
                );
            }
            ProtocolState::AwaitSize => {
                reply(
                    &mut self.port,
                    format_args!("ERROR:Expected SIZE:<width>,<height>, got: {}", line),
                );
            }
            ProtocolState::AwaitEnd => {
                reply(
                    &mut self.port,
                    format_args!("ERROR:Expected BMPEnd, got: {}", line),
                );
            }
            // Not line-reading states
            ProtocolState::ReceivingData | ProtocolState::Complete => {}
        }
    }
}

/// Format a response line into a bounded buffer and send it
///
/// Free function so callers can keep disjoint borrows of other engine
/// fields across the write.
fn reply<S: SerialPort>(port: &mut S, args: fmt::Arguments<'_>) {
    let mut line: String<160> = String::new();
    let _ = line.write_fmt(args);
    port.write_line(line.as_str());
}

/// Adapter: `core::fmt::Write` over a serial port
struct PortWriter<'p, S: SerialPort>(&'p mut S);

impl<S: SerialPort> Write for PortWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s);
        Ok(())
    }
}

#[cfg(test)]
mod tests;
