//! Flate stream decoder built on `flate2`.

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{CarveError, Result};

/// Whether `data` starts with a valid zlib header (deflate, window <= 32K,
/// FCHECK ok).
fn has_zlib_header(data: &[u8]) -> bool {
    match data {
        [cmf, flg, ..] => {
            cmf & 0x0f == 8 && cmf >> 4 <= 7 && (u16::from(*cmf) << 8 | u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}

fn grow(out: &mut Vec<u8>, additional: usize) -> Result<()> {
    out.try_reserve_exact(additional)
        .map_err(|e| CarveError::alloc(out.len() + additional, e))
}

/// Inflate `data`.
///
/// Zlib-wrapped input is expected; data without a valid zlib header is
/// inflated as raw deflate. The output starts at twice the input size and
/// doubles whenever it fills up. Input that runs out before the end-of-stream
/// marker keeps what was produced; a corrupt or empty stream is
/// `InvalidData`.
pub fn flatedecode(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(CarveError::invalid("flate: empty stream"));
    }
    let mut decoder = Decompress::new(has_zlib_header(data));
    let mut out: Vec<u8> = Vec::new();
    grow(&mut out, data.len().saturating_mul(2).max(64))?;

    loop {
        let consumed = decoder.total_in() as usize;
        let produced = decoder.total_out();
        let status = decoder
            .decompress_vec(&data[consumed..], &mut out, FlushDecompress::None)
            .map_err(|e| CarveError::invalid(format!("flate: {e}")))?;

        if status == Status::StreamEnd {
            break;
        }
        if out.len() == out.capacity() {
            let current = out.capacity();
            grow(&mut out, current)?;
            continue;
        }
        let exhausted = decoder.total_in() as usize >= data.len();
        let stalled = decoder.total_out() == produced && decoder.total_in() as usize == consumed;
        if exhausted || stalled {
            break;
        }
    }

    out.shrink_to_fit();
    Ok(out)
}
