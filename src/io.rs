//! Byte-at-a-time I/O adapters used by the engine.
//!
//! The engine only ever asks for one byte or hands over one byte. A source
//! reports exhaustion with `Ok(None)`; `Err` is reserved for transport
//! failures, so the two never get confused.

use std::io::{self, Read, Write};

/// Where `,` gets its bytes from.
pub trait ByteInput {
    /// Next byte, or `Ok(None)` once the source is exhausted.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Where `.` sends its bytes.
pub trait ByteOutput {
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Called once when a session ends, whether or not it succeeded.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: ByteInput + ?Sized> ByteInput for &mut T {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

impl<T: ByteOutput + ?Sized> ByteOutput for &mut T {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        (**self).write_byte(byte)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }
}

/// Reads one byte at a time from any [`Read`].
///
/// Wrap unbuffered sources (files, sockets) in a `BufReader` first.
pub struct StreamInput<R> {
    inner: R,
}

impl<R: Read> StreamInput<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteInput for StreamInput<R> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Writes each byte straight through to any [`Write`].
pub struct StreamOutput<W> {
    inner: W,
}

impl<W: Write> StreamOutput<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ByteOutput for StreamOutput<W> {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.inner.write_all(&[byte])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Serves the characters of a string in order, one cell value each, then
/// reports exhaustion.
///
/// Characters up to U+00FF map to the byte of the same value. Anything wider
/// does not fit in a cell and fails the read with [`io::ErrorKind::InvalidData`].
#[derive(Debug, Clone)]
pub struct StringInput {
    chars: Vec<char>,
    pos: usize,
}

impl StringInput {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    /// Characters not yet handed out.
    pub fn remaining(&self) -> &[char] {
        &self.chars[self.pos..]
    }
}

impl ByteInput for StringInput {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let Some(&c) = self.chars.get(self.pos) else {
            return Ok(None);
        };
        let byte = u8::try_from(c).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("input character {c:?} (U+{:04X}) does not fit in a cell", u32::from(c)),
            )
        })?;
        self.pos += 1;
        Ok(Some(byte))
    }
}

/// Collects written bytes for conversion back into a string.
#[derive(Debug, Clone, Default)]
pub struct StringOutput {
    bytes: Vec<u8>,
}

impl StringOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// One character per byte, U+0000 to U+00FF.
    pub fn into_string(self) -> String {
        self.bytes.iter().copied().map(char::from).collect()
    }
}

impl ByteOutput for StringOutput {
    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.bytes.push(byte);
        Ok(())
    }
}
