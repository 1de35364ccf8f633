use alloc::collections::VecDeque;
use alloc::string::String as HeapString;
use alloc::vec;
use alloc::vec::Vec;

use heapless::String;

use crate::color;
use crate::config::{DisplayConfig, PinAssignment, Rotation, UsableArea};
use crate::display::DisplayRegistry;
use crate::traits::{PanelDriver, PanelError, SerialPort};

use super::{ProtocolEngine, ProtocolState, SELECT_PROMPT_MS, TIMEOUT_MS};

/// Serial double: scripted input queue, captured output
struct MockSerial {
    input: VecDeque<u8>,
    output: HeapString,
}

impl MockSerial {
    fn new() -> Self {
        Self {
            input: VecDeque::new(),
            output: HeapString::new(),
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    fn push_line(&mut self, line: &str) {
        self.push(line.as_bytes());
        self.push(b"\n");
    }

    fn take_output(&mut self) -> HeapString {
        core::mem::take(&mut self.output)
    }
}

impl SerialPort for MockSerial {
    fn read_byte(&mut self) -> Option<u8> {
        self.input.pop_front()
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.output.push_str(&HeapString::from_utf8_lossy(bytes));
    }
}

/// Panel double with a readable framebuffer
struct MockPanel {
    width: u16,
    height: u16,
    pixels: Vec<u16>,
    rotation: Rotation,
}

impl MockPanel {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
            rotation: Rotation::Portrait,
        }
    }

    fn pixel(&self, x: i32, y: i32) -> u16 {
        self.pixels[y as usize * self.width as usize + x as usize]
    }
}

impl PanelDriver for MockPanel {
    fn init(&mut self) -> Result<(), PanelError> {
        Ok(())
    }

    fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    fn fill_screen(&mut self, color: u16) {
        self.pixels.fill(color);
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: u16) {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            self.pixels[y as usize * self.width as usize + x as usize] = color;
        }
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: u16, height: u16, color: u16) {
        let (w, h) = (width as i32, height as i32);
        for dx in 0..w {
            self.draw_pixel(x + dx, y, color);
            self.draw_pixel(x + dx, y + h - 1, color);
        }
        for dy in 0..h {
            self.draw_pixel(x, y + dy, color);
            self.draw_pixel(x + w - 1, y + dy, color);
        }
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16) {
        if x0 == x1 {
            for y in y0.min(y1)..=y0.max(y1) {
                self.draw_pixel(x0, y, color);
            }
        } else {
            for x in x0.min(x1)..=x0.max(x1) {
                self.draw_pixel(x, y0, color);
            }
        }
    }

    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }

    fn read_pixel(&self, x: i32, y: i32) -> Option<u16> {
        if x >= 0 && x < self.width as i32 && y >= 0 && y < self.height as i32 {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }
}

/// 40x30 panel, usable (2,2)+36x26, center (20,15)
fn config_named(name: &str) -> DisplayConfig {
    DisplayConfig {
        name: String::try_from(name).unwrap(),
        manufacturer: String::try_from("Test").unwrap(),
        model: String::try_from("ST7735R").unwrap(),
        pins: PinAssignment::default(),
        width: 40,
        height: 30,
        rotation: Rotation::Landscape,
        usable: UsableArea {
            x: 2,
            y: 2,
            width: 36,
            height: 26,
        },
        center_x: 20,
        center_y: 15,
    }
}

fn make_registry() -> DisplayRegistry<MockPanel> {
    let mut registry = DisplayRegistry::new();
    registry
        .add(config_named("Left"), MockPanel::new(40, 30))
        .unwrap();
    registry
        .add(config_named("Right"), MockPanel::new(40, 30))
        .unwrap();
    assert!(registry.initialize_all());
    registry
}

/// Queue one line and run one poll
fn send_line<'a>(
    engine: &mut ProtocolEngine<'a, MockPanel, MockSerial>,
    line: &str,
    now: u64,
) -> HeapString {
    engine.port_mut().push_line(line);
    engine.process(now);
    engine.port_mut().take_output()
}

#[test]
fn test_display_selection() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());
    assert_eq!(engine.state(), ProtocolState::SelectDisplay);

    let out = send_line(&mut engine, "DISPLAY:Left", 10);
    assert!(out.contains("DISPLAY_READY:Left"));
    assert_eq!(engine.state(), ProtocolState::AwaitStart);
    assert_eq!(engine.active_display().unwrap().name(), "Left");
}

#[test]
fn test_display_not_found_stays_put() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    let out = send_line(&mut engine, "DISPLAY:Center", 10);
    assert!(out.contains("ERROR: Display not found: Center"));
    assert_eq!(engine.state(), ProtocolState::SelectDisplay);
    assert!(engine.active_display().is_none());
}

#[test]
fn test_full_transfer_round_trip() {
    let mut registry = make_registry();
    {
        let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

        send_line(&mut engine, "DISPLAY:Left", 0);
        let out = send_line(&mut engine, "BMPStart", 1);
        assert!(out.contains("Start marker received"));
        assert_eq!(engine.state(), ProtocolState::AwaitSize);

        let out = send_line(&mut engine, "SIZE:4,4", 2);
        assert!(out.contains("READY"));
        assert!(out.contains("Receiving bitmap: 4x4"));
        assert!(out.contains("Centering at offset: (18, 13)"));
        assert_eq!(engine.state(), ProtocolState::ReceivingData);

        // 16 pixels, values 0..16, big-endian
        let mut stream = Vec::new();
        for value in 0..16u16 {
            stream.extend_from_slice(&value.to_be_bytes());
        }
        engine.port_mut().push(&stream);
        engine.process(3);
        assert_eq!(engine.state(), ProtocolState::AwaitEnd);

        let out = send_line(&mut engine, "BMPEnd", 4);
        assert!(out.contains("COMPLETE"));
        assert_eq!(engine.state(), ProtocolState::Complete);

        // Complete auto-advances without consuming input
        engine.process(5);
        assert_eq!(engine.state(), ProtocolState::AwaitStart);
        assert!(engine.port_mut().take_output().contains("Ready for next bitmap"));
    }

    // Bitmap centered at offset (18, 13)
    let panel = registry.get("Left").unwrap().driver();
    for row in 0..4i32 {
        for col in 0..4i32 {
            assert_eq!(panel.pixel(18 + col, 13 + row), (row * 4 + col) as u16);
        }
    }
    // Default frame (enabled, white, 1px) drawn over the usable bounds
    assert_eq!(panel.pixel(2, 2), color::WHITE);
    assert_eq!(panel.pixel(37, 27), color::WHITE);
}

#[test]
fn test_second_bmpend_rejected_until_next_start() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    send_line(&mut engine, "DISPLAY:Left", 0);
    send_line(&mut engine, "BMPStart", 1);
    send_line(&mut engine, "SIZE:2,2", 2);
    let mut stream = Vec::new();
    for value in 0..4u16 {
        stream.extend_from_slice(&value.to_be_bytes());
    }
    engine.port_mut().push(&stream);
    engine.process(3);
    send_line(&mut engine, "BMPEnd", 4);
    engine.process(5); // Complete -> AwaitStart
    engine.port_mut().take_output();

    let out = send_line(&mut engine, "BMPEnd", 6);
    assert!(out.contains("ERROR:Expected BMPStart, got: BMPEnd"));
    assert_eq!(engine.state(), ProtocolState::AwaitStart);

    // A new transfer still works
    let out = send_line(&mut engine, "BMPStart", 7);
    assert!(out.contains("Start marker received"));
}

#[test]
fn test_pixel_pair_split_across_polls() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    send_line(&mut engine, "DISPLAY:Left", 0);
    send_line(&mut engine, "BMPStart", 1);
    send_line(&mut engine, "SIZE:2,1", 2);

    engine.port_mut().push(&[0x12]);
    engine.process(3);
    assert_eq!(engine.state(), ProtocolState::ReceivingData);

    engine.port_mut().push(&[0x34]);
    engine.process(4);

    assert_eq!(engine.active_display().unwrap().driver().pixel(19, 15), 0x1234);
}

#[test]
fn test_progress_reports_every_ten_rows() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    send_line(&mut engine, "DISPLAY:Left", 0);
    send_line(&mut engine, "BMPStart", 1);
    send_line(&mut engine, "SIZE:2,20", 2);

    let mut stream = Vec::new();
    for _ in 0..(2 * 20) {
        stream.extend_from_slice(&0x07E0u16.to_be_bytes());
    }
    engine.port_mut().push(&stream);
    engine.process(3);

    let out = engine.port_mut().take_output();
    assert!(out.contains("Progress: 50.0% (Row 10/20)"));
    assert_eq!(engine.state(), ProtocolState::AwaitEnd);
}

#[test]
fn test_size_validation_failures_keep_state() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    send_line(&mut engine, "DISPLAY:Left", 0);
    send_line(&mut engine, "BMPStart", 1);

    let out = send_line(&mut engine, "SIZE:0,5", 2);
    assert!(out.contains("ERROR:Invalid dimensions: width=0, height=5"));
    assert_eq!(engine.state(), ProtocolState::AwaitSize);

    let out = send_line(&mut engine, "SIZE:2000,5", 3);
    assert!(out.contains("ERROR:Dimensions too large: width=2000, height=5"));
    assert_eq!(engine.state(), ProtocolState::AwaitSize);

    let out = send_line(&mut engine, "SIZE:37,5", 4);
    assert!(out.contains("ERROR:Width 37 exceeds usable width 36"));
    assert_eq!(engine.state(), ProtocolState::AwaitSize);

    let out = send_line(&mut engine, "SIZE:5,27", 5);
    assert!(out.contains("ERROR:Height 27 exceeds usable height 26"));
    assert_eq!(engine.state(), ProtocolState::AwaitSize);

    // A valid size still goes through after the rejections
    let out = send_line(&mut engine, "SIZE:4,4", 6);
    assert!(out.contains("READY"));
    assert_eq!(engine.state(), ProtocolState::ReceivingData);
}

#[test]
fn test_size_format_error() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    send_line(&mut engine, "DISPLAY:Left", 0);
    send_line(&mut engine, "BMPStart", 1);
    let out = send_line(&mut engine, "SIZE:12", 2);
    assert!(out.contains("ERROR:Invalid size format"));
    assert_eq!(engine.state(), ProtocolState::AwaitSize);
}

#[test]
fn test_timeout_aborts_transfer() {
    let mut registry = make_registry();
    {
        let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

        send_line(&mut engine, "DISPLAY:Left", 0);
        send_line(&mut engine, "BMPStart", 10);
        send_line(&mut engine, "SIZE:4,4", 20);
        assert_eq!(engine.state(), ProtocolState::ReceivingData);

        // Within the bound: nothing happens
        engine.check_timeout(20 + TIMEOUT_MS);
        assert_eq!(engine.state(), ProtocolState::ReceivingData);

        engine.check_timeout(21 + TIMEOUT_MS);
        let out = engine.port_mut().take_output();
        assert!(out.contains("ERROR: Timeout waiting for data"));
        assert!(out.contains("Timeout - resetting protocol"));
        assert_eq!(engine.state(), ProtocolState::SelectDisplay);
        assert!(engine.active_display().is_none());
        assert_eq!(*engine.adjustments(), Default::default());
    }

    // The abort painted the error screen
    let panel = registry.get("Left").unwrap().driver();
    assert_eq!(panel.pixel(0, 0), color::RED);
    assert_eq!(panel.pixel(20, 15), color::RED);
}

#[test]
fn test_no_timeout_in_interactive_states() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    engine.check_timeout(1_000_000);
    assert_eq!(engine.state(), ProtocolState::SelectDisplay);

    send_line(&mut engine, "DISPLAY:Left", 0);
    engine.check_timeout(1_000_000);
    assert_eq!(engine.state(), ProtocolState::AwaitStart);
}

#[test]
fn test_idle_prompt_in_select_state() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    engine.process(SELECT_PROMPT_MS - 1);
    assert!(engine.port_mut().take_output().is_empty());

    engine.process(SELECT_PROMPT_MS);
    assert!(engine
        .port_mut()
        .take_output()
        .contains("Ready for next bitmap"));

    // The prompt timer re-arms
    engine.process(SELECT_PROMPT_MS + 1);
    assert!(engine.port_mut().take_output().is_empty());
}

#[test]
fn test_bare_reset_from_mid_transfer() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    send_line(&mut engine, "DISPLAY:Left", 0);
    send_line(&mut engine, "BMPStart", 1);
    assert_eq!(engine.state(), ProtocolState::AwaitSize);

    let out = send_line(&mut engine, "RESET", 2);
    assert!(out.contains("Protocol reset"));
    assert_eq!(engine.state(), ProtocolState::SelectDisplay);
    assert!(engine.active_display().is_none());
}

#[test]
fn test_menu_reset_resets_adjustments() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    send_line(&mut engine, "DISPLAY:Left", 0);
    send_line(&mut engine, "CMD:ADJUST_TOP:5", 1);
    assert_eq!(engine.adjustments().top, 5);

    let out = send_line(&mut engine, "CMD:RESET", 2);
    assert!(out.contains("OK:Protocol reset"));
    assert_eq!(engine.state(), ProtocolState::SelectDisplay);
    assert_eq!(*engine.adjustments(), Default::default());
}

#[test]
fn test_menu_commands_run_in_any_line_state() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    send_line(&mut engine, "DISPLAY:Left", 0);
    send_line(&mut engine, "BMPStart", 1);
    assert_eq!(engine.state(), ProtocolState::AwaitSize);

    // INFO runs mid-transfer without advancing the machine
    let out = send_line(&mut engine, "CMD:INFO", 2);
    assert!(out.contains("OK:DISPLAY_INFO"));
    assert!(out.contains("Name:Left"));
    assert!(out.contains("Resolution:36x26"));
    assert!(out.contains("END_INFO"));
    assert_eq!(engine.state(), ProtocolState::AwaitSize);
}

#[test]
fn test_list_command() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    let out = send_line(&mut engine, "CMD:LIST", 0);
    assert!(out.contains("OK:DISPLAY_LIST"));
    assert!(out.contains("Count:2"));
    assert!(out.contains("[0] Left - 40x30 (Test ST7735R)"));
    assert!(out.contains("[1] Right - 40x30 (Test ST7735R)"));
    assert!(out.contains("END_LIST"));
}

#[test]
fn test_help_command() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    let out = send_line(&mut engine, "CMD:HELP", 0);
    assert!(out.contains("OK:HELP"));
    assert!(out.contains("CMD:UPDATE_CONFIG"));
    assert!(out.contains("END_HELP"));
}

#[test]
fn test_menu_commands_require_active_display() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    for cmd in ["CMD:INFO", "CMD:TEST", "CMD:FRAME_ON", "CMD:ADJUST_TOP:1"] {
        let out = send_line(&mut engine, cmd, 0);
        assert!(
            out.contains("ERROR:No active display selected"),
            "{} should require a display",
            cmd
        );
    }
}

#[test]
fn test_adjust_out_of_range_names_bound() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());
    send_line(&mut engine, "DISPLAY:Left", 0);

    // usableY = 2, outer bound 10 beyond the panel edge: max adjustment 12
    let out = send_line(&mut engine, "CMD:ADJUST_TOP:120", 1);
    assert!(out.contains("ERROR:Top edge would be beyond limit (maximum adjustment: 12)"));
    assert_eq!(engine.adjustments().top, 0);

    let out = send_line(&mut engine, "CMD:ADJUST_TOP:-100", 2);
    assert!(out.contains("ERROR:Top edge would be past center-10 (minimum adjustment: -3)"));
    assert_eq!(engine.adjustments().top, 0);
}

#[test]
fn test_adjust_applies_and_redraws_preview() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());
    send_line(&mut engine, "DISPLAY:Left", 0);

    let out = send_line(&mut engine, "CMD:ADJUST_TOP:5", 1);
    assert!(out.contains("OK:Top edge adjusted to 5"));
    assert_eq!(engine.adjustments().top, 5);

    // Live preview frame drawn at the adjusted rectangle: the left
    // column of the layer-0 outline is visible from row 0 down
    let panel = engine.active_display().unwrap().driver();
    assert_eq!(panel.pixel(2, 0), color::WHITE);
}

#[test]
fn test_adjust_at_outer_limit_notices() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());
    send_line(&mut engine, "DISPLAY:Left", 0);

    let out = send_line(&mut engine, "CMD:ADJUST_TOP:12", 1);
    assert!(out.contains("OK:Top edge adjusted to 12"));
    assert!(out.contains("NOTICE:Top edge at maximum outward position"));
}

#[test]
fn test_adjustments_narrow_the_pixel_clip() {
    let mut registry = make_registry();
    {
        let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

        send_line(&mut engine, "FRAME:OFF", 0);
        send_line(&mut engine, "DISPLAY:Left", 1);
        // Pull the left edge in as far as the center band allows:
        // new left edge = 2 - (-8) = 10
        send_line(&mut engine, "CMD:ADJUST_LEFT:-8", 2);
        send_line(&mut engine, "BMPStart", 3);
        // 24 wide, centered at offset 8: columns 8..=31
        send_line(&mut engine, "SIZE:24,4", 4);

        let mut stream = Vec::new();
        for _ in 0..(24 * 4) {
            stream.extend_from_slice(&color::CYAN.to_be_bytes());
        }
        engine.port_mut().push(&stream);
        engine.process(5);
        send_line(&mut engine, "BMPEnd", 6);
    }

    // Columns left of the adjusted edge were cropped; the rest drawn
    let panel = registry.get("Left").unwrap().driver();
    assert_eq!(panel.pixel(8, 13), color::BLACK);
    assert_eq!(panel.pixel(9, 16), color::BLACK);
    assert_eq!(panel.pixel(10, 13), color::CYAN);
    assert_eq!(panel.pixel(31, 16), color::CYAN);
}

#[test]
fn test_update_config_commits_and_resets_adjustments() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    send_line(&mut engine, "DISPLAY:Left", 0);
    send_line(&mut engine, "CMD:ADJUST_TOP:3", 1);
    assert_eq!(engine.adjustments().top, 3);

    let out = send_line(&mut engine, "CMD:UPDATE_CONFIG:3,36,4,25,19,14", 2);
    assert!(out.contains("OK:Base configuration updated"));
    assert!(out.contains("New usable area: 3,36,4,25"));
    assert!(out.contains("New center: 19,14"));
    assert!(out.contains("NOTE:Changes lost on power cycle"));

    // usableWidth = right-left+1, usableHeight = bottom-top+1
    let cfg = engine.active_display().unwrap().config();
    assert_eq!(cfg.usable.x, 3);
    assert_eq!(cfg.usable.width, 34);
    assert_eq!(cfg.usable.y, 4);
    assert_eq!(cfg.usable.height, 22);
    assert_eq!((cfg.center_x, cfg.center_y), (19, 14));

    // Committing a new base resets the session adjustments
    assert_eq!(*engine.adjustments(), Default::default());
}

#[test]
fn test_update_config_rejects_unordered_edges() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());
    send_line(&mut engine, "DISPLAY:Left", 0);

    let before = engine.active_display().unwrap().config().clone();
    let out = send_line(&mut engine, "CMD:UPDATE_CONFIG:36,3,4,25,19,14", 1);
    assert!(out.contains("ERROR:Invalid usable area"));
    assert_eq!(*engine.active_display().unwrap().config(), before);
}

#[test]
fn test_update_config_parameter_count_errors() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());
    send_line(&mut engine, "DISPLAY:Left", 0);

    let out = send_line(&mut engine, "CMD:UPDATE_CONFIG:1,2,3", 1);
    assert!(out.contains("ERROR:Expected 6 parameters"));

    let out = send_line(&mut engine, "CMD:UPDATE_CONFIG:1,2,3,4,5,6,7", 2);
    assert!(out.contains("ERROR:Too many parameters"));
}

#[test]
fn test_frame_thickness_range() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());
    send_line(&mut engine, "DISPLAY:Left", 0);

    let out = send_line(&mut engine, "CMD:FRAME_THICKNESS:11", 1);
    assert!(out.contains("ERROR:Thickness must be between 1 and 10"));

    let out = send_line(&mut engine, "CMD:FRAME_THICKNESS:3", 2);
    assert!(out.contains("OK:Frame thickness set to 3"));
}

#[test]
fn test_frame_off_skips_decoration() {
    let mut registry = make_registry();
    {
        let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

        let out = send_line(&mut engine, "FRAME:OFF", 0);
        assert!(out.contains("Frame disabled"));
        assert!(!engine.image_frame_enabled());

        send_line(&mut engine, "DISPLAY:Left", 1);
        send_line(&mut engine, "BMPStart", 2);
        send_line(&mut engine, "SIZE:2,2", 3);
        let mut stream = Vec::new();
        for _ in 0..4 {
            stream.extend_from_slice(&color::GREEN.to_be_bytes());
        }
        engine.port_mut().push(&stream);
        engine.process(4);
        send_line(&mut engine, "BMPEnd", 5);
    }

    // No frame was drawn on the usable bounds
    let panel = registry.get("Left").unwrap().driver();
    assert_eq!(panel.pixel(2, 2), color::BLACK);
}

#[test]
fn test_orientation_command() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());
    send_line(&mut engine, "DISPLAY:Left", 0);

    let out = send_line(&mut engine, "CMD:ORIENTATION:7", 1);
    assert!(out.contains("ERROR:Invalid orientation"));

    let out = send_line(&mut engine, "CMD:ORIENTATION:2", 2);
    assert!(out.contains("OK:Orientation set to 2"));
    assert_eq!(
        engine.active_display().unwrap().config().rotation,
        Rotation::PortraitFlipped
    );
}

#[test]
fn test_unknown_command_reported() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    let out = send_line(&mut engine, "CMD:BOGUS", 0);
    assert!(out.contains("ERROR:Unknown command: BOGUS"));

    let out = send_line(&mut engine, "gibberish", 1);
    assert!(out.contains("ERROR:Unknown command: gibberish"));
    assert_eq!(engine.state(), ProtocolState::SelectDisplay);
}

#[test]
fn test_transfer_commands_need_selection_first() {
    let mut registry = make_registry();
    let mut engine = ProtocolEngine::new(&mut registry, MockSerial::new());

    let out = send_line(&mut engine, "BMPStart", 0);
    assert!(out.contains("ERROR:Select a display first with DISPLAY:<name>"));
    assert_eq!(engine.state(), ProtocolState::SelectDisplay);
}
