//! Serial port trait
//!
//! The protocol engine polls a non-blocking byte source and writes
//! newline-terminated responses. Writes are assumed to succeed; a host
//! that stops draining the port loses output, not protocol state.

/// Trait for the serial link to the host client
pub trait SerialPort {
    /// Take the next received byte, if one is buffered
    fn read_byte(&mut self) -> Option<u8>;

    /// Write raw bytes
    fn write_bytes(&mut self, bytes: &[u8]);

    /// Write a string
    fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Write a string followed by a newline
    fn write_line(&mut self, s: &str) {
        self.write_str(s);
        self.write_bytes(b"\n");
    }
}
