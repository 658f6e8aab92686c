//! ASCII85 and ASCIIHex stream decoders.

use crate::buffer::{ByteBuffer, ByteCursor};
use crate::error::{CarveError, Result};

/// Value of the `u` digit, used to pad a trailing partial group.
const PAD_DIGIT: u32 = 84;

/// Decode ASCII85-encoded data (PDF variant).
///
/// Digits `!`..=`u` accumulate base-85 into a big-endian 32-bit group that is
/// flushed every 5 digits. `z` stands for four zero bytes, `~` ends the data
/// and any other byte is skipped. A trailing group of `n` digits is padded
/// with `u` and yields `n - 1` bytes.
pub fn ascii85decode(data: &[u8]) -> Result<Vec<u8>> {
    let data = data.strip_prefix(b"<~").unwrap_or(data);
    let mut out = ByteBuffer::with_size(data.len())?;

    let mut tuple: u32 = 0;
    let mut count = 0usize;
    for &byte in data {
        match byte {
            b'!'..=b'u' => {
                tuple = tuple.wrapping_mul(85).wrapping_add(u32::from(byte - b'!'));
                count += 1;
                if count == 5 {
                    out.append(&tuple.to_be_bytes())?;
                    tuple = 0;
                    count = 0;
                }
            }
            b'z' => {
                tuple = 0;
                count = 0;
                out.fill(0, 4)?;
            }
            b'~' => break,
            _ => {}
        }
    }

    if count > 1 {
        for _ in count..5 {
            tuple = tuple.wrapping_mul(85).wrapping_add(PAD_DIGIT);
        }
        out.append(&tuple.to_be_bytes()[..count - 1])?;
    }

    Ok(out.finish())
}

/// Decode ASCIIHex-encoded data.
///
/// Line terminators between pairs are skipped and `>` at a pair boundary
/// ends the data. Any other non-hex byte, or an odd trailing digit, is
/// `InvalidData`.
pub fn asciihexdecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = ByteCursor::new(data);
    let mut out = ByteBuffer::with_size(data.len() / 2)?;

    loop {
        cursor.skip_eol();
        match cursor.peek() {
            Err(_) | Ok(b'>') => break,
            Ok(_) => {}
        }
        match cursor.hex_value() {
            Ok(byte) => out.push(byte)?,
            Err(CarveError::EndOfData) => {
                return Err(CarveError::invalid("odd number of hex digits"));
            }
            Err(e) => return Err(e),
        }
    }

    Ok(out.finish())
}
