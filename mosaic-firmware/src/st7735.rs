//! ST7735 TFT Display Driver
//!
//! Driver for 160x128 ST7735R-based color panels over SPI, implementing
//! the core's `PanelDriver` contract. Chip select lives in the
//! `SpiDevice`; data/command, reset, and backlight are plain GPIOs.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use mosaic_core::config::Rotation;
use mosaic_core::traits::{PanelDriver, PanelError};

/// ST7735 commands
#[allow(dead_code)]
mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const NORON: u8 = 0x13;
    pub const INVOFF: u8 = 0x20;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const RASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const COLMOD: u8 = 0x3A;
    pub const FRMCTR1: u8 = 0xB1;
}

/// MADCTL bits
const MADCTL_MY: u8 = 0x80;
const MADCTL_MX: u8 = 0x40;
const MADCTL_MV: u8 = 0x20;

/// Native (rotation 0) panel dimensions
const NATIVE_WIDTH: u16 = 128;
const NATIVE_HEIGHT: u16 = 160;

/// ST7735 TFT driver
pub struct St7735<SPI, DC, RST, BL, D> {
    spi: SPI,
    dc: DC,
    rst: RST,
    backlight: BL,
    delay: D,
    rotation: Rotation,
    width: u16,
    height: u16,
}

impl<SPI, DC, RST, BL, D> St7735<SPI, DC, RST, BL, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    D: DelayNs,
{
    pub fn new(spi: SPI, dc: DC, rst: RST, backlight: BL, delay: D) -> Self {
        Self {
            spi,
            dc,
            rst,
            backlight,
            delay,
            rotation: Rotation::Portrait,
            width: NATIVE_WIDTH,
            height: NATIVE_HEIGHT,
        }
    }

    fn command(&mut self, command: u8, args: &[u8]) -> Result<(), PanelError> {
        self.dc.set_low().map_err(|_| PanelError::Bus)?;
        self.spi.write(&[command]).map_err(|_| PanelError::Bus)?;
        if !args.is_empty() {
            self.dc.set_high().map_err(|_| PanelError::Bus)?;
            self.spi.write(args).map_err(|_| PanelError::Bus)?;
        }
        Ok(())
    }

    fn data(&mut self, data: &[u8]) -> Result<(), PanelError> {
        self.dc.set_high().map_err(|_| PanelError::Bus)?;
        self.spi.write(data).map_err(|_| PanelError::Bus)
    }

    /// Select the drawing window, end coordinates inclusive
    fn set_window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), PanelError> {
        self.command(
            cmd::CASET,
            &[(x0 >> 8) as u8, x0 as u8, (x1 >> 8) as u8, x1 as u8],
        )?;
        self.command(
            cmd::RASET,
            &[(y0 >> 8) as u8, y0 as u8, (y1 >> 8) as u8, y1 as u8],
        )?;
        self.command(cmd::RAMWR, &[])
    }

    fn madctl_value(rotation: Rotation) -> u8 {
        match rotation {
            Rotation::Portrait => MADCTL_MX | MADCTL_MY,
            Rotation::Landscape => MADCTL_MY | MADCTL_MV,
            Rotation::PortraitFlipped => 0,
            Rotation::LandscapeFlipped => MADCTL_MX | MADCTL_MV,
        }
    }

    fn hline(&mut self, x0: i32, x1: i32, y: i32, color: u16) {
        let (x0, x1) = (x0.min(x1), x0.max(x1));
        for x in x0..=x1 {
            self.draw_pixel(x, y, color);
        }
    }

    fn vline(&mut self, x: i32, y0: i32, y1: i32, color: u16) {
        let (y0, y1) = (y0.min(y1), y0.max(y1));
        for y in y0..=y1 {
            self.draw_pixel(x, y, color);
        }
    }
}

impl<SPI, DC, RST, BL, D> PanelDriver for St7735<SPI, DC, RST, BL, D>
where
    SPI: SpiDevice,
    DC: OutputPin,
    RST: OutputPin,
    BL: OutputPin,
    D: DelayNs,
{
    fn init(&mut self) -> Result<(), PanelError> {
        // Hardware reset pulse
        self.rst.set_high().map_err(|_| PanelError::NotResponding)?;
        self.delay.delay_ms(10);
        self.rst.set_low().map_err(|_| PanelError::NotResponding)?;
        self.delay.delay_ms(10);
        self.rst.set_high().map_err(|_| PanelError::NotResponding)?;
        self.delay.delay_ms(10);

        self.command(cmd::SWRESET, &[])?;
        self.delay.delay_ms(150);
        self.command(cmd::SLPOUT, &[])?;
        self.delay.delay_ms(120);

        // Frame rate and pixel format (RGB565)
        self.command(cmd::FRMCTR1, &[0x01, 0x2C, 0x2D])?;
        self.command(cmd::COLMOD, &[0x05])?;
        self.delay.delay_ms(10);

        self.command(cmd::MADCTL, &[Self::madctl_value(self.rotation)])?;
        self.command(cmd::INVOFF, &[])?;
        self.command(cmd::NORON, &[])?;
        self.delay.delay_ms(10);
        self.command(cmd::DISPON, &[])?;
        self.delay.delay_ms(100);

        let _ = self.backlight.set_high();
        Ok(())
    }

    fn set_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
        (self.width, self.height) = match rotation {
            Rotation::Portrait | Rotation::PortraitFlipped => (NATIVE_WIDTH, NATIVE_HEIGHT),
            Rotation::Landscape | Rotation::LandscapeFlipped => (NATIVE_HEIGHT, NATIVE_WIDTH),
        };
        let _ = self.command(cmd::MADCTL, &[Self::madctl_value(rotation)]);
    }

    fn fill_screen(&mut self, color: u16) {
        if self
            .set_window(0, 0, self.width - 1, self.height - 1)
            .is_err()
        {
            return;
        }

        // Stream the fill in chunks to keep the transaction count down
        let bytes = color.to_be_bytes();
        let mut chunk = [0u8; 64];
        for pair in chunk.chunks_exact_mut(2) {
            pair.copy_from_slice(&bytes);
        }

        let mut remaining = self.width as usize * self.height as usize * 2;
        while remaining > 0 {
            let n = remaining.min(chunk.len());
            if self.data(&chunk[..n]).is_err() {
                return;
            }
            remaining -= n;
        }
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: u16) {
        if x < 0 || x >= self.width as i32 || y < 0 || y >= self.height as i32 {
            return;
        }
        let (x, y) = (x as u16, y as u16);
        if self.set_window(x, y, x, y).is_ok() {
            let _ = self.data(&color.to_be_bytes());
        }
    }

    fn draw_rect(&mut self, x: i32, y: i32, width: u16, height: u16, color: u16) {
        if width == 0 || height == 0 {
            return;
        }
        let (x1, y1) = (x + width as i32 - 1, y + height as i32 - 1);
        self.hline(x, x1, y, color);
        self.hline(x, x1, y1, color);
        self.vline(x, y, y1, color);
        self.vline(x1, y, y1, color);
    }

    fn draw_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u16) {
        if x0 == x1 {
            self.vline(x0, y0, y1, color);
            return;
        }
        if y0 == y1 {
            self.hline(x0, x1, y0, color);
            return;
        }

        // Bresenham
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;

        loop {
            self.draw_pixel(x, y, color);
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn width(&self) -> u16 {
        self.width
    }

    fn height(&self) -> u16 {
        self.height
    }
}
