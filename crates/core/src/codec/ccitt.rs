//! CCITT fax payload wrapping.
//!
//! The Group 3/4 data is not decoded. It is placed, unchanged, as the single
//! strip of a minimal little-endian TIFF so that image tools can open it.

use crate::buffer::ByteBuffer;
use crate::error::{CarveError, Result};
use crate::parser::ObjectParams;

/// Size of the synthetic TIFF header: signature, IFD offset, tag count,
/// 8 tags and the next-IFD offset.
pub const TIFF_HEADER_LEN: usize = 8 + 2 + TAG_COUNT * 12 + 4;

const TAG_COUNT: usize = 8;
const TYPE_SHORT: u16 = 3;
const TYPE_LONG: u16 = 4;

/// Decode parameters of a `CCITTFaxDecode` stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CcittParams {
    pub k: i64,
    pub end_of_line: bool,
    pub encoded_byte_align: bool,
    pub columns: i64,
    pub rows: i64,
    pub end_of_block: bool,
    pub black_is_1: bool,
    pub image_mask: bool,
}

impl Default for CcittParams {
    fn default() -> Self {
        Self {
            k: 0,
            end_of_line: false,
            encoded_byte_align: false,
            columns: 1728,
            rows: 0,
            end_of_block: true,
            black_is_1: false,
            image_mask: false,
        }
    }
}

impl CcittParams {
    /// Read the parameters from an object dictionary, keeping the defaults
    /// for anything missing.
    pub fn from_params(params: &ObjectParams<'_>) -> Self {
        let d = Self::default();
        Self {
            k: params.get_int("/K", d.k, false),
            end_of_line: params.get_bool("/EndOfLine", d.end_of_line),
            encoded_byte_align: params.get_bool("/EncodedByteAlign", d.encoded_byte_align),
            columns: params.get_int("/Columns", d.columns, false),
            rows: params.get_int("/Rows", d.rows, false),
            end_of_block: params.get_bool("/EndOfBlock", d.end_of_block),
            black_is_1: params.get_bool("/BlackIs1", d.black_is_1),
            image_mask: params.get_bool("/ImageMask", d.image_mask),
        }
    }

    /// TIFF compression scheme: 4 (T.6) for negative K, else 3 (T.4).
    pub const fn compression(&self) -> u32 {
        if self.k < 0 { 4 } else { 3 }
    }
}

/// Wrap CCITT-encoded `data` in a single-strip TIFF.
///
/// With `image_mask` set the payload is returned as is.
pub fn ccitt_wrap(data: &[u8], params: &CcittParams) -> Result<Vec<u8>> {
    if params.image_mask {
        let mut out = ByteBuffer::with_size(data.len())?;
        out.append(data)?;
        return Ok(out.finish());
    }

    let columns = tiff_long(params.columns);
    let rows = tiff_long(params.rows);
    let strip_len = u32::try_from(data.len())
        .map_err(|_| CarveError::invalid("CCITT payload too large for TIFF"))?;

    let mut out = ByteBuffer::with_size(TIFF_HEADER_LEN + data.len())?;
    out.append(b"II")?;
    out.append(&42u16.to_le_bytes())?;
    out.append(&8u32.to_le_bytes())?;
    out.append(&(TAG_COUNT as u16).to_le_bytes())?;

    let tags: [(u16, u16, u32); TAG_COUNT] = [
        (256, TYPE_LONG, columns),
        (257, TYPE_LONG, rows),
        (258, TYPE_SHORT, 1),
        (259, TYPE_SHORT, params.compression()),
        (262, TYPE_SHORT, u32::from(params.black_is_1)),
        (273, TYPE_LONG, TIFF_HEADER_LEN as u32),
        (278, TYPE_LONG, rows),
        (279, TYPE_LONG, strip_len),
    ];
    for (tag, kind, value) in tags {
        out.append(&tag.to_le_bytes())?;
        out.append(&kind.to_le_bytes())?;
        out.append(&1u32.to_le_bytes())?;
        // SHORT values sit left-justified in the 4-byte field, which in
        // little-endian is the same as writing them as a LONG.
        out.append(&value.to_le_bytes())?;
    }
    out.append(&0u32.to_le_bytes())?;
    out.append(data)?;

    Ok(out.finish())
}

/// Dimension as a TIFF LONG. Out-of-range values are clamped so the payload
/// is still written.
fn tiff_long(value: i64) -> u32 {
    value.clamp(0, i64::from(u32::MAX)) as u32
}
