//! Serial port adapter
//!
//! Bridges any blocking `embedded-io` transport to the core's
//! `SerialPort` contract: non-blocking single-byte reads, fire-and-forget
//! writes.

use embedded_io::{Read, ReadReady, Write};

use mosaic_core::traits::SerialPort;

/// `SerialPort` over a buffered embedded-io transport
pub struct UartPort<T> {
    io: T,
}

impl<T> UartPort<T> {
    pub fn new(io: T) -> Self {
        Self { io }
    }
}

impl<T: Read + ReadReady + Write> SerialPort for UartPort<T> {
    fn read_byte(&mut self) -> Option<u8> {
        match self.io.read_ready() {
            Ok(true) => {
                let mut buf = [0u8; 1];
                match self.io.read(&mut buf) {
                    Ok(n) if n > 0 => Some(buf[0]),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        // Protocol responses are best-effort; a host that stops draining
        // the port loses output, not protocol state
        let _ = self.io.write_all(bytes);
    }
}
