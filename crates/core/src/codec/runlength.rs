//! RunLength (PackBits) stream decoder.

use crate::buffer::{ByteBuffer, ByteCursor};
use crate::error::{CarveError, Result};

/// End-of-data length byte.
const EOD: u8 = 0x80;

/// Decode RunLength-encoded data.
///
/// Format:
/// - Length byte 0-127: copy the next (length + 1) bytes literally
/// - Length byte 128: end of data
/// - Length byte 129-255: repeat the next byte (257 - length) times
///
/// A literal run cut short by the end of input copies what is there. A
/// repeat run with no byte to repeat is `InvalidData`.
pub fn rldecode(data: &[u8]) -> Result<Vec<u8>> {
    let mut cursor = ByteCursor::new(data);
    let mut out = ByteBuffer::with_size(data.len().saturating_mul(2))?;

    while let Ok(length) = cursor.read_byte() {
        match length {
            EOD => break,
            0..=0x7f => {
                let run = cursor.remaining();
                let count = (usize::from(length) + 1).min(run.len());
                out.append(&run[..count])?;
                cursor.set_pos(cursor.pos() + count);
            }
            _ => {
                let byte = cursor
                    .read_byte()
                    .map_err(|_| CarveError::invalid("repeat run without a byte"))?;
                out.fill(byte, 0x101 - usize::from(length))?;
            }
        }
    }

    Ok(out.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_literal_copies_available() {
        assert_eq!(rldecode(&[0x05, b'a', b'b']).unwrap(), b"ab");
    }

    #[test]
    fn missing_repeat_byte() {
        assert!(matches!(rldecode(&[0x00, b'x', 0xfe]), Err(CarveError::InvalidData(_))));
    }
}
