//! Transport abstraction: any non-blocking byte stream a slot can own.
//!
//! The relay itself uses `Async<TcpStream>`; tests plug in in-memory
//! streams so fan-out and slot bookkeeping run without sockets.

use std::io::{self, Read, Write};
use std::net::TcpStream;

use async_io_mini::Async;

/// Non-blocking byte-oriented channel.
///
/// Both calls must return `WouldBlock` instead of waiting.
pub trait Transport {
    /// Read up to `buf.len()` bytes. `Ok(0)` means the peer closed.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write a prefix of `data`, returning how much was taken.
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;
}

impl Transport for Async<TcpStream> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut stream: &TcpStream = self.get_ref();
        stream.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut stream: &TcpStream = self.get_ref();
        stream.write(data)
    }
}
