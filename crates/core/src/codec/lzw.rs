//! LZW stream decoder (PDF variant: MSB-first codes, 9 to 12 bits).
//!
//! The string table is index-addressed. Each entry stores its prefix code,
//! the length of the sequence it stands for and its last byte, so a code is
//! expanded by walking the prefix chain backward into a scratch buffer.

use crate::buffer::ByteBuffer;
use crate::error::{CarveError, Result};

const CLEAR_TABLE: u16 = 256;
const END_OF_DATA: u16 = 257;
const FIRST_CODE: u16 = 258;
const TABLE_SIZE: usize = 4097;
const MIN_WIDTH: u32 = 9;

#[derive(Debug, Clone, Copy, Default)]
struct Entry {
    prefix: u16,
    length: u16,
    tail: u8,
}

/// MSB-first bit reader over the encoded bytes.
struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    const fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    fn remaining_bits(&self) -> usize {
        self.data.len() * 8 - self.bit_pos
    }

    fn read(&mut self, width: u32) -> Result<u16> {
        if self.remaining_bits() < width as usize {
            return Err(CarveError::invalid("truncated LZW code"));
        }
        let mut code = 0u16;
        for _ in 0..width {
            let byte = self.data[self.bit_pos / 8];
            let bit = (byte >> (7 - self.bit_pos % 8)) & 1;
            code = (code << 1) | u16::from(bit);
            self.bit_pos += 1;
        }
        Ok(code)
    }
}

/// Decode LZW-encoded data with the PDF default `EarlyChange` of 1.
pub fn lzwdecode(data: &[u8]) -> Result<Vec<u8>> {
    lzwdecode_with_earlychange(data, 1)
}

/// Decode LZW-encoded data with an explicit `EarlyChange` setting.
///
/// With `early_change` 1 the code width grows one table slot early; 0 uses
/// the plain TIFF boundaries. Codes beyond the next assignable slot and a
/// full table are `InvalidData`. Fewer than 8 bits left over at the end of
/// input are treated as padding.
pub fn lzwdecode_with_earlychange(data: &[u8], early_change: i32) -> Result<Vec<u8>> {
    let early = usize::from(early_change != 0);
    let mut reader = BitReader::new(data);
    let mut out = ByteBuffer::with_size(data.len().saturating_mul(2))?;

    let mut table = vec![Entry::default(); TABLE_SIZE];
    for (i, entry) in table.iter_mut().enumerate().take(256) {
        *entry = Entry {
            prefix: 0,
            length: 1,
            tail: i as u8,
        };
    }

    let mut scratch: Vec<u8> = Vec::with_capacity(TABLE_SIZE);
    let mut next_code = FIRST_CODE;
    let mut width = MIN_WIDTH;
    let mut prev: Option<u16> = None;

    while reader.remaining_bits() >= 8 {
        let code = reader.read(width)?;
        match code {
            END_OF_DATA => break,
            CLEAR_TABLE => {
                next_code = FIRST_CODE;
                width = MIN_WIDTH;
                prev = None;
                continue;
            }
            _ => {}
        }
        if usize::from(next_code) >= TABLE_SIZE {
            return Err(CarveError::invalid("LZW table overflow"));
        }

        scratch.clear();
        if code < next_code {
            expand(&table, code, &mut scratch);
        } else if let Some(prev) = prev.filter(|_| code == next_code) {
            // KwKwK: the code being defined by this very step.
            expand(&table, prev, &mut scratch);
            scratch.push(scratch[0]);
        } else {
            return Err(CarveError::invalid(format!(
                "LZW code {code} beyond next slot {next_code}"
            )));
        }

        if let Some(prev) = prev {
            table[usize::from(next_code)] = Entry {
                prefix: prev,
                length: table[usize::from(prev)].length + 1,
                tail: scratch[0],
            };
            next_code += 1;
        }
        width = match usize::from(next_code) + early {
            n if n >= 2048 => 12,
            n if n >= 1024 => 11,
            n if n >= 512 => 10,
            _ => MIN_WIDTH,
        };

        prev = Some(code);
        out.append(&scratch)?;
    }

    Ok(out.finish())
}

/// Write the sequence for `code` into `scratch`, first byte first.
fn expand(table: &[Entry], code: u16, scratch: &mut Vec<u8>) {
    let length = usize::from(table[usize::from(code)].length);
    scratch.resize(length, 0);
    let mut code = code;
    for slot in scratch.iter_mut().rev() {
        let entry = table[usize::from(code)];
        *slot = entry.tail;
        code = entry.prefix;
    }
}
