//! Exposes a specialized reader trait.
//!
//! The format is mostly delimiter separated, so the reader needs a byte of
//! lookahead. String payloads however are not: they are read as a raw span of
//! exactly as many bytes as their length prefix declares, since the payload
//! may contain quotes, delimiters, or whatever else.

use std::io;

use crate::error::{Error, Position, Result};

/// Specialized reader trait for use with [`Deserializer`](crate::de::Deserializer).
///
/// By default, this is implemented for [`SliceRead`] and [`IoRead`].
///
/// This trait also allows access to borrowed data if supported at runtime.
/// `'de` represents that borrowed lifetime and is otherwise unused.
pub trait Read<'de> {
    /// Returns the next byte without consuming it, or [`None`] at the end of
    /// the input.
    fn peek(&mut self) -> Result<Option<u8>>;

    /// Consumes and returns the next byte, or [`None`] at the end of the
    /// input.
    fn next(&mut self) -> Result<Option<u8>>;

    /// Reads a chunk of bytes, possibly borrowed from the reader for the
    /// duration of the call.
    fn read_byte_view<F, T>(&mut self, len: usize, access: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> Result<T>;

    /// Reads a chunk of bytes, returning it as a newly allocated [`Vec`].
    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>>;

    /// Attempts to read a chunk of bytes, borrowing from the reader.
    ///
    /// If the reader supports borrowing data from it, returns [`Some`] with the
    /// result of the operation. If the reader does not support it, returns
    /// [`None`] without advancing.
    ///
    /// If [`None`] was returned, calling another reader method with the same
    /// `len` must have the same result as if this method was never called.
    fn try_read_bytes_borrow(&mut self, len: usize) -> Option<Result<&'de [u8]>> {
        _ = len;
        None
    }

    /// Reads and discards a chunk of bytes.
    fn skip_bytes(&mut self, len: usize) -> Result<()> {
        self.read_byte_view(len, |_| Ok(()))
    }

    /// Gets the position of the next byte to be read.
    fn position(&self) -> Position;
}

/// Wraps a slice so it can be used as a [`Read`].
///
/// You cannot directly construct this type. Instead use
/// [`Deserializer::from_slice`](crate::de::Deserializer::from_slice).
#[derive(Debug)]
pub struct SliceRead<'de> {
    slice: &'de [u8],
    index: usize,
    // line of `index` and the index its line starts at
    line: usize,
    line_start: usize,
}

impl<'de> SliceRead<'de> {
    pub(crate) fn new(slice: &'de [u8]) -> Self {
        Self {
            slice,
            index: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// Moves the index to `end`, counting the lines passed on the way.
    fn advance_to(&mut self, end: usize) {
        let passed = &self.slice[self.index..end];
        if let Some(last) = passed.iter().rposition(|&b| b == b'\n') {
            self.line += passed.iter().filter(|&&b| b == b'\n').count();
            self.line_start = self.index + last + 1;
        }

        self.index = end;
    }

    /// Gets the remaining unread part of the slice.
    pub(crate) fn remainder(&self) -> &'de [u8] {
        &self.slice[self.index..]
    }

    #[inline]
    fn read_bytes_borrow(&mut self, len: usize) -> Result<&'de [u8]> {
        let rem = self.remainder();
        let Some((out, _)) = rem.split_at_checked(len) else {
            // report the end of the input rather than where the span started
            self.advance_to(self.slice.len());
            return Err(self.eof());
        };

        self.advance_to(self.index + len);
        Ok(out)
    }

    fn eof(&self) -> Error {
        Error::Eof {
            position: self.position(),
        }
    }
}

impl<'de> Read<'de> for SliceRead<'de> {
    fn peek(&mut self) -> Result<Option<u8>> {
        Ok(self.slice.get(self.index).copied())
    }

    fn next(&mut self) -> Result<Option<u8>> {
        let next = self.slice.get(self.index).copied();
        if let Some(b) = next {
            self.index += 1;
            if b == b'\n' {
                self.line += 1;
                self.line_start = self.index;
            }
        }

        Ok(next)
    }

    fn read_byte_view<F, T>(&mut self, len: usize, access: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        self.read_bytes_borrow(len).and_then(access)
    }

    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        self.read_bytes_borrow(len).map(<[u8]>::to_vec)
    }

    fn try_read_bytes_borrow(&mut self, len: usize) -> Option<Result<&'de [u8]>> {
        Some(self.read_bytes_borrow(len))
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.index - self.line_start + 1,
        }
    }
}

/// Wraps a [`io::Read`] implementation so it can be used as a [`Read`].
///
/// Single bytes are read one at a time from the inner reader, so it should
/// be buffered, f.e. with [`io::BufReader`].
///
/// You cannot directly construct this type. Instead use
/// [`Deserializer::from_reader`](crate::de::Deserializer::from_reader).
#[derive(Debug)]
pub struct IoRead<R> {
    pub(crate) inner: R,
    peeked: Option<u8>,
    position: Position,
}

impl<R> IoRead<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
            position: Position::START,
        }
    }

    fn advance(&mut self, bytes: &[u8]) {
        for &b in bytes {
            if b == b'\n' {
                self.position.line += 1;
                self.position.column = 1;
            } else {
                self.position.column += 1;
            }
        }
    }

    fn eof(&self) -> Error {
        Error::Eof {
            position: self.position,
        }
    }
}

impl<R: io::Read> IoRead<R> {
    fn fill_peek(&mut self) -> Result<Option<u8>> {
        if self.peeked.is_none() {
            let mut buf = [0u8];
            loop {
                match self.inner.read(&mut buf) {
                    Ok(0) => return Ok(None),
                    Ok(_) => break,
                    Err(why) if why.kind() == io::ErrorKind::Interrupted => {},
                    Err(why) => return Err(why.into()),
                }
            }

            self.peeked = Some(buf[0]);
        }

        Ok(self.peeked)
    }
}

impl<R: io::Read> Read<'_> for IoRead<R> {
    fn peek(&mut self) -> Result<Option<u8>> {
        self.fill_peek()
    }

    fn next(&mut self) -> Result<Option<u8>> {
        let next = self.fill_peek()?;
        if let Some(b) = next {
            self.peeked = None;
            self.advance(&[b]);
        }

        Ok(next)
    }

    fn read_byte_view<F, T>(&mut self, len: usize, access: F) -> Result<T>
    where
        F: FnOnce(&[u8]) -> Result<T>,
    {
        const STACK: usize = 0x1000;

        if len <= STACK && self.peeked.is_none() {
            let mut buf = [0u8; STACK];
            let buf = &mut buf[..len];
            if let Err(why) = self.inner.read_exact(buf) {
                return Err(match why.kind() {
                    io::ErrorKind::UnexpectedEof => self.eof(),
                    _ => why.into(),
                });
            }

            self.advance(buf);
            access(buf)
        } else {
            // allocate if more than 4KiB is requested. we don't want to blow up the stack
            // in case the data is wrong.
            let vec = self.read_byte_vec(len)?;
            access(&vec)
        }
    }

    #[inline(never)]
    fn read_byte_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        use std::io::Read as _;

        // don't allocate too much or incorrect data could lead to a DoS
        let capacity = len.min(0x1000);
        let mut buf = Vec::with_capacity(capacity);

        if len != 0
            && let Some(b) = self.peeked.take()
        {
            buf.push(b);
        }

        let limit = u64::try_from(len - buf.len()).map_err(|_| self.eof())?;
        self.inner.by_ref().take(limit).read_to_end(&mut buf)?;
        self.advance(&buf);

        if buf.len() == len {
            Ok(buf)
        } else {
            Err(self.eof())
        }
    }

    fn skip_bytes(&mut self, len: usize) -> Result<()> {
        let mut skipped = 0usize;
        if len != 0
            && let Some(b) = self.peeked.take()
        {
            self.advance(&[b]);
            skipped = 1;
        }

        // stream through in chunks instead of allocating the whole payload
        let mut buf = [0u8; 0x400];
        while skipped < len {
            let chunk = &mut buf[..(len - skipped).min(0x400)];
            match self.inner.read(chunk) {
                Ok(0) => return Err(self.eof()),
                Ok(n) => {
                    self.advance(&chunk[..n]);
                    skipped += n;
                },
                Err(why) if why.kind() == io::ErrorKind::Interrupted => {},
                Err(why) => return Err(why.into()),
            }
        }

        Ok(())
    }

    fn position(&self) -> Position {
        self.position
    }
}
