use pdfcarve_core::CarveError;
use pdfcarve_core::codec::rldecode;

/// PackBits encoder: repeat runs of 2..=128, literal runs of up to 128.
fn packbits(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < data.len() {
        let mut run = 1;
        while i + run < data.len() && run < 128 && data[i + run] == data[i] {
            run += 1;
        }
        if run >= 2 {
            out.push((257 - run) as u8);
            out.push(data[i]);
            i += run;
            continue;
        }
        let start = i;
        i += 1;
        while i < data.len() && i - start < 128 && !(i + 1 < data.len() && data[i] == data[i + 1]) {
            i += 1;
        }
        out.push((i - start - 1) as u8);
        out.extend_from_slice(&data[start..i]);
    }
    out.push(0x80);
    out
}

#[test]
fn test_rldecode() {
    let input = b"\x05123456\xfa7\x04abcde\x80junk";
    assert_eq!(rldecode(input).unwrap(), b"1234567777777abcde");
}

#[test]
fn test_rldecode_reference_encoder() {
    let mut data = Vec::new();
    data.extend_from_slice(b"abcdef");
    data.extend(std::iter::repeat_n(b'x', 300));
    data.extend((0..=255u8).cycle().take(700));
    data.extend_from_slice(b"zz");
    assert_eq!(rldecode(&packbits(&data)).unwrap(), data);
}

#[test]
fn test_rldecode_stops_at_first_eod() {
    let mut encoded = packbits(b"first");
    encoded.extend_from_slice(&packbits(b"second"));
    assert_eq!(rldecode(&encoded).unwrap(), b"first");
}

#[test]
fn test_rldecode_without_eod() {
    assert_eq!(rldecode(b"\x01ab\xfdc").unwrap(), b"abcccc");
}

#[test]
fn test_rldecode_truncated_repeat() {
    assert!(matches!(rldecode(b"\x01ab\xfd"), Err(CarveError::InvalidData(_))));
}
