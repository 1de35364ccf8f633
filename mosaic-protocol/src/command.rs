//! Typed command grammar for the serial control channel.
//!
//! Every command line maps to one tagged variant with a typed payload,
//! so the interpreter matches exhaustively instead of chaining prefix
//! tests. Parsing is stateless; whether a command is legal in the current
//! protocol state is the engine's call.

/// A display edge addressed by a calibration adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    /// Capitalized edge name as used in serial responses
    pub const fn name(&self) -> &'static str {
        match self {
            Edge::Top => "Top",
            Edge::Bottom => "Bottom",
            Edge::Left => "Left",
            Edge::Right => "Right",
        }
    }
}

/// `FRAME:` session default updates, accepted while idle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameSetting {
    On,
    Off,
    Color(u16),
    Thickness(i32),
}

/// Payload of `CMD:UPDATE_CONFIG:left,right,top,bottom,centerX,centerY`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UsableAreaUpdate {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
    pub center_x: i32,
    pub center_y: i32,
}

/// Menu/control commands carried behind the `CMD:` prefix
///
/// These are intercepted in every line-reading state and never advance
/// the transfer state machine, `Reset` excepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MenuCommand {
    Reset,
    List,
    Info,
    Test,
    TestAll,
    FrameOn,
    FrameOff,
    FrameColor(u16),
    /// Raw value; the 1..=10 range check happens at execution
    FrameThickness(i32),
    Adjust { edge: Edge, value: i8 },
    Calibrate,
    UpdateConfig(UsableAreaUpdate),
    /// Raw value; the 0..=3 range check happens at execution
    Orientation(i32),
    Help,
}

/// One parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command<'a> {
    /// Bare `RESET`
    Reset,
    /// `CMD:<name>[:<args>]`
    Menu(MenuCommand),
    /// `FRAME:<setting>`
    Frame(FrameSetting),
    /// `DISPLAY:<name>`
    SelectDisplay(&'a str),
    /// `BMPStart`
    BmpStart,
    /// `SIZE:<w>,<h>`
    Size { width: i32, height: i32 },
    /// `BMPEnd`
    BmpEnd,
}

/// Errors from command parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Line matches no catalogued command
    UnknownCommand,
    /// A numeric payload failed to parse or overflows its type
    InvalidValue,
    /// `UPDATE_CONFIG` carried the wrong number of parameters
    WrongParameterCount(usize),
    /// `SIZE:` payload is not `<w>,<h>`
    InvalidSizeFormat,
}

impl<'a> Command<'a> {
    /// Parse one trimmed, non-empty command line
    pub fn parse(line: &'a str) -> Result<Self, ParseError> {
        if line == "RESET" {
            return Ok(Command::Reset);
        }
        if line == "BMPStart" {
            return Ok(Command::BmpStart);
        }
        if line == "BMPEnd" {
            return Ok(Command::BmpEnd);
        }
        if let Some(rest) = line.strip_prefix("CMD:") {
            return MenuCommand::parse(rest.trim()).map(Command::Menu);
        }
        if let Some(rest) = line.strip_prefix("FRAME:") {
            return parse_frame_setting(rest).map(Command::Frame);
        }
        if let Some(rest) = line.strip_prefix("DISPLAY:") {
            return Ok(Command::SelectDisplay(rest.trim()));
        }
        if let Some(rest) = line.strip_prefix("SIZE:") {
            let (w, h) = rest.split_once(',').ok_or(ParseError::InvalidSizeFormat)?;
            let width = parse_int(w).map_err(|_| ParseError::InvalidSizeFormat)?;
            let height = parse_int(h).map_err(|_| ParseError::InvalidSizeFormat)?;
            return Ok(Command::Size { width, height });
        }

        Err(ParseError::UnknownCommand)
    }
}

impl MenuCommand {
    /// Parse the text after the `CMD:` prefix
    pub fn parse(cmd: &str) -> Result<Self, ParseError> {
        match cmd {
            "RESET" => return Ok(MenuCommand::Reset),
            "LIST" => return Ok(MenuCommand::List),
            "INFO" => return Ok(MenuCommand::Info),
            "TEST" => return Ok(MenuCommand::Test),
            "TEST_ALL" => return Ok(MenuCommand::TestAll),
            "FRAME_ON" => return Ok(MenuCommand::FrameOn),
            "FRAME_OFF" => return Ok(MenuCommand::FrameOff),
            "CALIBRATE" => return Ok(MenuCommand::Calibrate),
            "HELP" => return Ok(MenuCommand::Help),
            _ => {}
        }

        if let Some(value) = cmd.strip_prefix("FRAME_COLOR:") {
            let color: u16 = value.trim().parse().map_err(|_| ParseError::InvalidValue)?;
            return Ok(MenuCommand::FrameColor(color));
        }
        if let Some(value) = cmd.strip_prefix("FRAME_THICKNESS:") {
            return Ok(MenuCommand::FrameThickness(
                parse_int(value).map_err(|_| ParseError::InvalidValue)?,
            ));
        }
        if let Some(value) = cmd.strip_prefix("ADJUST_TOP:") {
            return parse_adjust(Edge::Top, value);
        }
        if let Some(value) = cmd.strip_prefix("ADJUST_BOTTOM:") {
            return parse_adjust(Edge::Bottom, value);
        }
        if let Some(value) = cmd.strip_prefix("ADJUST_LEFT:") {
            return parse_adjust(Edge::Left, value);
        }
        if let Some(value) = cmd.strip_prefix("ADJUST_RIGHT:") {
            return parse_adjust(Edge::Right, value);
        }
        if let Some(params) = cmd.strip_prefix("UPDATE_CONFIG:") {
            return parse_update_config(params);
        }
        if let Some(value) = cmd.strip_prefix("ORIENTATION:") {
            return Ok(MenuCommand::Orientation(
                parse_int(value).map_err(|_| ParseError::InvalidValue)?,
            ));
        }

        Err(ParseError::UnknownCommand)
    }
}

fn parse_frame_setting(rest: &str) -> Result<FrameSetting, ParseError> {
    match rest {
        "ON" => return Ok(FrameSetting::On),
        "OFF" => return Ok(FrameSetting::Off),
        _ => {}
    }
    if let Some(value) = rest.strip_prefix("COLOR:") {
        let color: u16 = value.trim().parse().map_err(|_| ParseError::InvalidValue)?;
        return Ok(FrameSetting::Color(color));
    }
    if let Some(value) = rest.strip_prefix("THICKNESS:") {
        return Ok(FrameSetting::Thickness(
            parse_int(value).map_err(|_| ParseError::InvalidValue)?,
        ));
    }
    Err(ParseError::UnknownCommand)
}

fn parse_adjust(edge: Edge, value: &str) -> Result<MenuCommand, ParseError> {
    // Adjustments are bounded to a signed byte on the wire
    let value: i8 = value.trim().parse().map_err(|_| ParseError::InvalidValue)?;
    Ok(MenuCommand::Adjust { edge, value })
}

fn parse_update_config(params: &str) -> Result<MenuCommand, ParseError> {
    let mut values = [0i32; 6];
    let mut count = 0;

    for field in params.split(',') {
        if count == values.len() {
            return Err(ParseError::WrongParameterCount(count + 1));
        }
        values[count] = parse_int(field).map_err(|_| ParseError::InvalidValue)?;
        count += 1;
    }

    if count != values.len() {
        return Err(ParseError::WrongParameterCount(count));
    }

    Ok(MenuCommand::UpdateConfig(UsableAreaUpdate {
        left: values[0],
        right: values[1],
        top: values[2],
        bottom: values[3],
        center_x: values[4],
        center_y: values[5],
    }))
}

fn parse_int(field: &str) -> Result<i32, core::num::ParseIntError> {
    field.trim().parse()
}
