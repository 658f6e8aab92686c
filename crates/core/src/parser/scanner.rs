//! Sequential object scanner.
//!
//! Walks raw PDF bytes line by line looking for `N G obj` headers, reads the
//! dictionary that follows and bounds the stream payload. No cross-reference
//! table is consulted. Anything that does not look like a stream object is
//! skipped, and a malformed object only costs that object.

use std::ops::Range;

use tracing::{debug, trace};

use crate::buffer::{ByteCursor, is_eol};
use crate::options::ScanOptions;
use crate::parser::ObjectParams;

const STREAM_MARKERS: [&[u8]; 3] = [b"stream\r\n", b"stream\r", b"stream\n"];
const ENDSTREAM: &[u8] = b"endstream";
const ENDSTREAM_MARKERS: [&[u8]; 3] = [b"endstream\r\n", b"endstream\r", b"endstream\n"];
const ENDOBJ_MARKERS: [&[u8]; 3] = [b"endobj\r\n", b"endobj\r", b"endobj\n"];

/// A stream object located by the scanner, not yet decoded.
///
/// Ranges index the byte slice the scanner was built over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawStream {
    pub objid: u32,
    /// Offset of the `N G obj` line.
    pub offset: usize,
    /// The dictionary, `<<` and `>>` included.
    pub dict: Range<usize>,
    /// Stream payload between the `stream` keyword line and `endstream`.
    pub payload: Range<usize>,
}

impl RawStream {
    pub fn params<'a>(&self, data: &'a [u8]) -> ObjectParams<'a> {
        ObjectParams::new(&data[self.dict.clone()])
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }
}

/// How the end of a stream payload was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// `/Length` pointed right at `endstream`.
    DeclaredLength,
    /// Linear search for `endstream`.
    Search,
}

/// Resumable scanner over a PDF byte range.
pub struct ObjectScanner<'a> {
    cursor: ByteCursor<'a>,
    options: ScanOptions,
}

impl<'a> ObjectScanner<'a> {
    pub fn new(data: &'a [u8], options: ScanOptions) -> Self {
        Self::at(data, 0, options)
    }

    /// Scanner starting at `pos` (clamped to the end of `data`).
    pub fn at(data: &'a [u8], pos: usize, options: ScanOptions) -> Self {
        let mut cursor = ByteCursor::new(data);
        cursor.set_pos(pos.min(data.len()));
        Self { cursor, options }
    }

    pub const fn position(&self) -> usize {
        self.cursor.pos()
    }

    /// Find the next stream object. `None` once the range is exhausted.
    pub fn next_stream(&mut self) -> Option<RawStream> {
        loop {
            self.cursor.skip_eol();
            if self.cursor.is_eof() {
                return None;
            }
            let offset = self.cursor.pos();
            let Some(objid) = self.read_header() else {
                trace!(offset, "skipping non-header line");
                self.cursor.find_end_of_line()?;
                continue;
            };
            match self.read_object(objid, offset) {
                Ok(stream) => return Some(stream),
                Err(reason) => debug!(objid, offset, reason, "discarding object"),
            }
        }
    }

    /// Parse an `<int> <int> obj` line. On failure the cursor is left at
    /// the start of the line.
    fn read_header(&mut self) -> Option<u32> {
        let start = self.cursor.pos();
        let parsed = self
            .cursor
            .load_line(self.options.max_header_line)
            .and_then(parse_header_line);
        if parsed.is_none() {
            self.cursor.set_pos(start);
        }
        parsed
    }

    fn read_object(&mut self, objid: u32, offset: usize) -> Result<RawStream, &'static str> {
        // Tolerate blank lines between the header and the dictionary.
        self.cursor.skip_eol();
        self.cursor.skip_spaces();
        let dict = self.read_dictionary()?;
        self.cursor.skip_spaces();
        self.cursor.skip_eol();

        if !STREAM_MARKERS.iter().any(|m| self.cursor.consume(m)) {
            self.skip_endobj();
            return Err("no stream keyword");
        }

        let start = self.cursor.pos();
        let data = self.cursor.data();
        let params = ObjectParams::new(&data[dict.clone()]);
        let (end, how) = self
            .bound_by_length(start, &params)
            .map(|end| (end, StreamEnd::DeclaredLength))
            .or_else(|| self.bound_by_search(start).map(|end| (end, StreamEnd::Search)))
            .ok_or("no endstream")?;
        trace!(objid, offset, len = end - start, strategy = ?how, "stream bounded");

        self.cursor.skip_eol();
        self.skip_endstream();
        self.cursor.skip_spaces();
        self.cursor.skip_eol();
        self.skip_endobj();

        Ok(RawStream {
            objid,
            offset,
            dict,
            payload: start..end,
        })
    }

    /// Balanced `<< ... >>` at the cursor; returns its range and moves past it.
    fn read_dictionary(&mut self) -> Result<Range<usize>, &'static str> {
        if !self.cursor.match_literal(b"<<") {
            return Err("no dictionary");
        }
        let data = self.cursor.data();
        let start = self.cursor.pos();
        let mut depth = 0usize;
        let mut i = start;
        while i + 1 < data.len() {
            match &data[i..i + 2] {
                b"<<" => {
                    depth += 1;
                    i += 2;
                }
                b">>" => {
                    depth -= 1;
                    i += 2;
                    if depth == 0 {
                        self.cursor.set_pos(i);
                        return Ok(start..i);
                    }
                }
                _ => i += 1,
            }
        }
        Err("unterminated dictionary")
    }

    /// Trust `/Length` if `endstream` follows the declared end (after an
    /// optional line break). Leaves the cursor past `endstream` on success.
    fn bound_by_length(&mut self, start: usize, params: &ObjectParams<'_>) -> Option<usize> {
        let length = usize::try_from(params.find_int("/Length", false)?).ok()?;
        let data = self.cursor.data();
        let end = start.checked_add(length)?;
        if end.checked_add(ENDSTREAM.len())? >= data.len() {
            return None;
        }
        let mut probe = end;
        while probe < data.len() && is_eol(data[probe]) {
            probe += 1;
        }
        if !data[probe..].starts_with(ENDSTREAM) {
            return None;
        }
        self.cursor.set_pos(end);
        Some(end)
    }

    /// Search forward for `endstream` preceded by a line break. The break
    /// itself is not part of the payload; `\n\r`, `\n` and `\r` are tried
    /// in that order. Leaves the cursor on the break.
    fn bound_by_search(&mut self, start: usize) -> Option<usize> {
        let data = self.cursor.data();
        let mut from = start;
        while from + ENDSTREAM.len() <= data.len() {
            let found = from + find(&data[from..], ENDSTREAM)?;
            let end = if found == start {
                Some(start)
            } else if found >= start + 2 && &data[found - 2..found] == b"\n\r" {
                Some(found - 2)
            } else if data[found - 1] == b'\n' || data[found - 1] == b'\r' {
                Some(found - 1)
            } else {
                None
            };
            if let Some(end) = end {
                self.cursor.set_pos(end);
                return Some(end);
            }
            from = found + 1;
        }
        None
    }

    fn skip_endstream(&mut self) {
        if !ENDSTREAM_MARKERS.iter().any(|m| self.cursor.consume(m)) {
            self.cursor.consume(ENDSTREAM);
        }
    }

    fn skip_endobj(&mut self) {
        if !ENDOBJ_MARKERS.iter().any(|m| self.cursor.consume(m)) {
            self.cursor.consume(b"endobj");
        }
    }
}

/// `<id> <generation> obj`, with optional trailing spaces or tabs.
fn parse_header_line(line: &[u8]) -> Option<u32> {
    let mut rest = line;
    let objid = take_uint(&mut rest)?;
    take_uint(&mut rest)?;
    let rest = trim_blanks(rest);
    let rest = rest.strip_prefix(b"obj")?;
    if !trim_blanks(rest).is_empty() {
        return None;
    }
    u32::try_from(objid).ok()
}

fn trim_blanks(s: &[u8]) -> &[u8] {
    let start = s.iter().position(|&b| b != b' ' && b != b'\t').unwrap_or(s.len());
    &s[start..]
}

/// Blank-prefixed decimal integer. Negative numbers are rejected.
fn take_uint(s: &mut &[u8]) -> Option<u64> {
    let trimmed = trim_blanks(s);
    let digits = trimmed.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let value = std::str::from_utf8(&trimmed[..digits]).ok()?.parse().ok()?;
    *s = &trimmed[digits..];
    Some(value)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
