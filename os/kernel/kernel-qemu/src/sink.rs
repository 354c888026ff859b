use core::fmt::{self, Write};
use kernel_ports::PortIo;

/// A [`fmt::Write`] that emits every byte to one I/O port.
///
/// No buffering and no allocation; a character is on the wire as soon as it
/// is formatted. Output is dropped unless the `enabled` feature is on.
pub struct PortSink<'a, IO: PortIo + ?Sized> {
    io: &'a IO,
    port: u16,
}

impl<'a, IO: PortIo + ?Sized> PortSink<'a, IO> {
    #[must_use]
    pub const fn new(io: &'a IO, port: u16) -> Self {
        Self { io, port }
    }

    /// Best-effort formatted write; errors are ignored.
    pub fn write_args(&mut self, args: fmt::Arguments<'_>) {
        let _ = self.write_fmt(args);
    }
}

impl<IO: PortIo + ?Sized> Write for PortSink<'_, IO> {
    #[inline]
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if cfg!(feature = "enabled") {
            for b in s.bytes() {
                self.io.write_u8(self.port, b);
            }
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "enabled"))]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Tape(RefCell<Vec<(u16, u8)>>);

    impl PortIo for Tape {
        fn read_u8(&self, _port: u16) -> u8 {
            0
        }

        fn write_u8(&self, port: u16, value: u8) {
            self.0.borrow_mut().push((port, value));
        }
    }

    #[test]
    fn bytes_go_to_one_port_in_order() {
        let tape = Tape(RefCell::new(Vec::new()));
        let mut sink = PortSink::new(&tape, 0xE9);
        sink.write_args(format_args!("{}{}", 'o', 'k'));
        assert_eq!(tape.0.into_inner(), vec![(0xE9, b'o'), (0xE9, b'k')]);
    }

    #[test]
    fn multibyte_characters_are_utf8_encoded() {
        let tape = Tape(RefCell::new(Vec::new()));
        PortSink::new(&tape, 0xE9).write_char('é').unwrap();
        let bytes: Vec<u8> = tape.0.into_inner().into_iter().map(|(_, b)| b).collect();
        assert_eq!(bytes, "é".as_bytes());
    }
}
