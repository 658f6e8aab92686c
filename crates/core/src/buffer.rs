//! Byte cursor and growable output buffer.
//!
//! `ByteCursor` is a zero-copy view over borrowed bytes with a scan
//! position; it carries the line, token and hex primitives the object
//! scanner is built from. `ByteBuffer` is the owned, growable buffer the
//! decoders write into.

use crate::error::{CarveError, Result};

/// Line terminator bytes recognized by the scanner.
#[inline]
pub(crate) const fn is_eol(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Read-only cursor over a borrowed byte range.
///
/// The position always stays within `0..=len`.
#[derive(Debug, Clone, Copy)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// The whole underlying range.
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub const fn pos(&self) -> usize {
        self.pos
    }

    /// Move to `pos`; refuses positions past the end.
    pub fn set_pos(&mut self, pos: usize) -> bool {
        if pos > self.data.len() {
            return false;
        }
        self.pos = pos;
        true
    }

    pub const fn is_eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Bytes from the cursor to the end.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    pub fn peek(&self) -> Result<u8> {
        self.data.get(self.pos).copied().ok_or(CarveError::EndOfData)
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        Ok(byte)
    }

    /// Bounds-checked compare at the cursor. Does not advance.
    pub fn match_literal(&self, literal: &[u8]) -> bool {
        self.remaining().starts_with(literal)
    }

    /// Advance past `literal` if it is at the cursor.
    pub fn consume(&mut self, literal: &[u8]) -> bool {
        if self.match_literal(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Skip a run of CR/LF bytes.
    pub fn skip_eol(&mut self) -> usize {
        let start = self.pos;
        while self.pos < self.data.len() && is_eol(self.data[self.pos]) {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Skip a run of 0x20 bytes.
    pub fn skip_spaces(&mut self) -> usize {
        let start = self.pos;
        while self.pos < self.data.len() && self.data[self.pos] == b' ' {
            self.pos += 1;
        }
        self.pos - start
    }

    /// Advance to the next line terminator and past the whole CR/LF run.
    ///
    /// Returns the new position, or `None` (cursor at the end) when no
    /// terminator is left.
    pub fn find_end_of_line(&mut self) -> Option<usize> {
        match self.remaining().iter().position(|&b| is_eol(b)) {
            Some(offset) => {
                self.pos += offset;
                self.skip_eol();
                Some(self.pos)
            }
            None => {
                self.pos = self.data.len();
                None
            }
        }
    }

    /// Read one line and move to the start of the next one.
    ///
    /// CRLF, LF and CR all terminate a line. A `<<` also ends the line, but
    /// the cursor stops on it so the dictionary can be parsed next. Lines
    /// longer than `max_len` and unterminated lines yield `None` and leave
    /// the cursor where it was.
    pub fn load_line(&mut self, max_len: usize) -> Option<&'a [u8]> {
        let start = self.pos;
        let data = self.data;
        let mut i = start;
        while i < data.len() {
            let (line_end, next) = match data[i] {
                b'<' if data.get(i + 1) == Some(&b'<') => (i, i),
                b'\r' if data.get(i + 1) == Some(&b'\n') => (i, i + 2),
                b'\r' | b'\n' => (i, i + 1),
                _ => {
                    i += 1;
                    continue;
                }
            };
            if line_end - start >= max_len {
                return None;
            }
            self.pos = next;
            return Some(&data[start..line_end]);
        }
        None
    }

    /// Decode one hex pair into a byte, skipping line terminators before it.
    ///
    /// Fails with `EndOfData` when fewer than two bytes remain and with
    /// `InvalidData` when either character is not a hex digit.
    pub fn hex_value(&mut self) -> Result<u8> {
        self.skip_eol();
        let pair = self
            .remaining()
            .get(..2)
            .ok_or(CarveError::EndOfData)?;
        let (hi, lo) = (pair[0], pair[1]);
        self.pos += 2;
        match (hex_nibble(hi), hex_nibble(lo)) {
            (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
            _ => Err(CarveError::invalid(format!(
                "invalid hex pair {:?}",
                String::from_utf8_lossy(pair)
            ))),
        }
    }
}

/// Map an ASCII hex digit to its value. Bytes above 0x80 are never digits.
pub(crate) const fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Owned, growable buffer with a write position.
///
/// The backing storage (`capacity()`) may be larger than what has been
/// written (`len()`); `finish` trims it to the written size.
#[derive(Debug, Default, Clone)]
pub struct ByteBuffer {
    data: Vec<u8>,
    pos: usize,
}

impl ByteBuffer {
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            pos: 0,
        }
    }

    /// Buffer with `size` zeroed bytes of backing storage.
    pub fn with_size(size: usize) -> Result<Self> {
        let mut buf = Self::new();
        buf.resize(size)?;
        Ok(buf)
    }

    /// Bytes written so far.
    pub const fn len(&self) -> usize {
        self.pos
    }

    pub const fn is_empty(&self) -> bool {
        self.pos == 0
    }

    /// Size of the backing storage.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.pos]
    }

    /// Grow or shrink the backing storage to exactly `size` bytes.
    ///
    /// Written bytes and the write position survive growth; shrinking below
    /// the position clamps it.
    pub fn resize(&mut self, size: usize) -> Result<()> {
        if size > self.data.len() {
            let extra = size - self.data.len();
            self.data
                .try_reserve_exact(extra)
                .map_err(|e| CarveError::alloc(size, e))?;
        }
        self.data.resize(size, 0);
        self.pos = self.pos.min(size);
        Ok(())
    }

    /// Make room for `needed` more bytes at the write position.
    fn ensure(&mut self, needed: usize) -> Result<()> {
        let required = self
            .pos
            .checked_add(needed)
            .ok_or(CarveError::AllocationFailure {
                requested: usize::MAX,
            })?;
        if required > self.data.len() {
            let current = self.data.len();
            let grown = current.saturating_mul(2).max(current + needed).max(required);
            self.resize(grown)?;
        }
        Ok(())
    }

    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure(bytes.len())?;
        self.data[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    pub fn push(&mut self, byte: u8) -> Result<()> {
        self.append(&[byte])
    }

    /// Append `count` copies of `byte`.
    pub fn fill(&mut self, byte: u8, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.data[self.pos..self.pos + count].fill(byte);
        self.pos += count;
        Ok(())
    }

    /// Trim to the written size and hand out the bytes.
    pub fn finish(mut self) -> Vec<u8> {
        self.data.truncate(self.pos);
        self.data
    }
}
