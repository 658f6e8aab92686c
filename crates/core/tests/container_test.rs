use std::io::Write;
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use pdfcarve_core::{CarveError, FilterTag, PdfBytes, PdfContainer, ScanOptions};

const PAYLOAD: &[u8] = b"BT /F1 12 Tf 72 712 Td (recovered text) Tj ET";

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn ascii85encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in data.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(group);
        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (value % 85) as u8 + b'!';
            value /= 85;
        }
        out.extend_from_slice(&digits[..chunk.len() + 1]);
    }
    out.extend_from_slice(b"~>");
    out
}

fn stream_object(id: u32, dict: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = format!("{id} 0 obj\n<< {dict} /Length {} >>\nstream\n", payload.len()).into_bytes();
    out.extend_from_slice(payload);
    out.extend_from_slice(b"\nendstream\nendobj\n");
    out
}

fn pdf(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut out = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n".to_vec();
    for object in objects {
        out.extend_from_slice(object);
    }
    out.extend_from_slice(b"trailer\n<< /Size 9 >>\nstartxref\n0\n%%EOF\n");
    out
}

fn open(objects: &[Vec<u8>]) -> Arc<PdfContainer> {
    PdfContainer::from_bytes(Bytes::from(pdf(objects))).unwrap()
}

#[test]
fn test_single_flate_object() {
    let container = open(&[stream_object(1, "/Filter /FlateDecode", &zlib(PAYLOAD))]);

    let object = container.next_object().unwrap().unwrap();
    assert_eq!(object.objid(), 1);
    assert_eq!(object.filters(), &[FilterTag::Flate]);
    assert_eq!(object.data().as_ref(), PAYLOAD);
    assert_eq!(object.unpacked_size(), PAYLOAD.len());
    assert_eq!(object.packed_size(), zlib(PAYLOAD).len());
    assert_eq!(object.name(), "object-stream-00000001.dat");
    assert_eq!(object.file_type(), "stream");

    assert!(container.next_object().unwrap().is_none());
    assert_eq!(container.len(), 1);
}

#[test]
fn test_ascii85_then_flate_matches_flate_only() {
    let flate_only = open(&[stream_object(1, "/Filter /FlateDecode", &zlib(PAYLOAD))]);
    let chained = open(&[stream_object(
        1,
        "/Filter [ /ASCII85Decode /FlateDecode ]",
        &ascii85encode(&zlib(PAYLOAD)),
    )]);

    let a = flate_only.next_object().unwrap().unwrap();
    let b = chained.next_object().unwrap().unwrap();
    assert_eq!(b.filters(), &[FilterTag::Ascii85, FilterTag::Flate]);
    assert_eq!(a.data(), b.data());
}

#[test]
fn test_short_filter_names_and_hex() {
    let container = open(&[stream_object(3, "/Filter [/AHx /Fl]", hex_text(&zlib(PAYLOAD)).as_bytes())]);
    let object = container.next_object().unwrap().unwrap();
    assert_eq!(object.data().as_ref(), PAYLOAD);
}

fn hex_text(data: &[u8]) -> String {
    format!("{}>", hex::encode_upper(data))
}

#[test]
fn test_broken_object_does_not_stop_scan() {
    let container = open(&[
        // Block type 3 is reserved in deflate.
        stream_object(1, "/Filter /FlateDecode", b"\x06\x00not deflate"),
        stream_object(2, "/Filter /ASCIIHexDecode", b"zz"),
        stream_object(3, "", b"plain"),
        stream_object(4, "/Filter /FlateDecode", b""),
    ]);

    let objects: Vec<_> = container.iter().collect::<Result<_, _>>().unwrap();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].objid(), 3);
    assert_eq!(objects[0].filters(), &[FilterTag::Plain]);
}

#[test]
fn test_extension_sniffing() {
    let container = open(&[
        stream_object(10, "/Subtype /Image /Filter /DCTDecode", b"\xff\xd8\xff\xe0\x00\x10JFIF"),
        stream_object(11, "/Type /Metadata /Subtype /XML", b"\xff\xd8\xff<?xpacket?>"),
        stream_object(12, "", b"P4\n8 1\n\xff"),
        stream_object(13, "/Type /EmbeddedFile", b"%PDF-1.4\n%%EOF"),
        stream_object(14, "", b"II*\0rest"),
        stream_object(15, "", b"MM\0*big endian"),
    ]);
    let names: Vec<String> = container.scan_all().unwrap().iter().map(|o| o.name()).collect();
    assert_eq!(
        names,
        vec![
            "object-stream-00000010.jpg",
            "object-stream-00000011.xml",
            "object-stream-00000012.pbm",
            "object-stream-00000013.pdf",
            "object-stream-00000014.tif",
            "object-stream-00000015.dat",
        ]
    );
}

#[test]
fn test_ccitt_object_becomes_tiff() {
    let container = open(&[stream_object(
        6,
        "/Filter [/CCITTFaxDecode /FlateDecode] /DecodeParms << /K -1 /Columns 16 /Rows 4 >>",
        b"\x26\xa0\x00\x10",
    )]);
    let object = container.next_object().unwrap().unwrap();
    assert_eq!(object.extension(), ".tif");
    assert_eq!(object.unpacked_size(), 110 + 4);
    assert!(object.data().ends_with(b"\x26\xa0\x00\x10"));
}

#[test]
fn test_passthrough_is_zero_copy() {
    let image = Bytes::from(pdf(&[stream_object(1, "/Filter /DCTDecode", b"\xff\xd8\xff\xdbjpeg")]));
    let container = PdfContainer::from_bytes(image.clone()).unwrap();
    let object = container.next_object().unwrap().unwrap();

    let range = image.as_ptr() as usize..image.as_ptr() as usize + image.len();
    assert!(range.contains(&(object.data().as_ptr() as usize)));
    assert!(matches!(container.bytes(), PdfBytes::Shared(_)));
}

#[test]
fn test_lookup_by_name() {
    let container = open(&[
        stream_object(5, "", b"first five"),
        stream_object(8, "", b"eight"),
        stream_object(5, "", b"second five"),
    ]);
    assert!(container.lookup_by_name("object-stream-00000005.dat").is_none());

    container.scan_all().unwrap();
    let found = container.lookup_by_name("object-stream-00000005.dat").unwrap();
    assert_eq!(found.data().as_ref(), b"first five");
    assert_eq!(container.lookup_by_name("anything-8.bin").unwrap().objid(), 8);
    assert!(container.lookup_by_name("object-stream-00000009.dat").is_none());
    assert!(container.lookup_by_name("no-digits.dat").is_none());

    assert_eq!(
        container.extract_to_memory("object-stream-00000008.dat").unwrap(),
        b"eight"
    );
    assert!(matches!(
        container.extract_to_memory("object-stream-00000009.dat"),
        Err(CarveError::Io(_))
    ));
}

#[test]
fn test_extract_to_directory() {
    let dir = tempfile::tempdir().unwrap();
    let container = open(&[stream_object(2, "/Filter /FlateDecode", &zlib(PAYLOAD))]);
    let object = container.next_object().unwrap().unwrap();

    let path = container.extract_to(&object.name(), dir.path()).unwrap();
    assert_eq!(path, dir.path().join("object-stream-00000002.dat"));
    assert_eq!(std::fs::read(path).unwrap(), PAYLOAD);
}

#[test]
fn test_close_keeps_outstanding_handles() {
    let container = open(&[stream_object(1, "", b"one"), stream_object(2, "", b"two")]);
    let first = container.next_object().unwrap().unwrap();
    container.close();

    assert!(container.is_empty());
    assert_eq!(first.data().as_ref(), b"one");
    assert_eq!(container.next_object().unwrap().unwrap().objid(), 2);
    assert_eq!(container.len(), 1);
}

#[test]
fn test_concurrent_next_object() {
    let objects: Vec<Vec<u8>> = (1..=40)
        .map(|id| stream_object(id, "/Filter /FlateDecode", &zlib(format!("object {id}").as_bytes())))
        .collect();
    let container = open(&objects);

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let container = Arc::clone(&container);
            thread::spawn(move || {
                let mut ids = Vec::new();
                while let Some(object) = container.next_object().unwrap() {
                    assert_eq!(object.data().as_ref(), format!("object {}", object.objid()).as_bytes());
                    ids.push(object.objid());
                }
                ids
            })
        })
        .collect();

    let mut ids: Vec<u32> = workers.into_iter().flat_map(|w| w.join().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=40).collect::<Vec<_>>());
    assert_eq!(container.len(), 40);
}

#[test]
fn test_format_checks() {
    assert!(matches!(
        PdfContainer::from_slice(b"GIF89a\n1 0 obj\n"),
        Err(CarveError::FormatMismatch(_))
    ));
    assert!(matches!(
        PdfContainer::probe_bytes(b"%PDF-1.5"),
        Err(CarveError::FormatMismatch(_))
    ));
    assert!(PdfContainer::probe_bytes(&pdf(&[])).is_ok());
}

#[test]
fn test_scan_stops_at_eof_marker() {
    let mut data = pdf(&[stream_object(1, "", b"before")]);
    data.extend_from_slice(&stream_object(2, "", b"after"));
    data.extend_from_slice(b"%%EOF\n");
    // Only the last %%EOF near the end bounds the scan.
    let container = PdfContainer::from_bytes(Bytes::from(data)).unwrap();
    assert_eq!(container.scan_all().unwrap().len(), 2);

    let single = pdf(&[stream_object(1, "", b"before")]);
    let marker = single.len() - b"%%EOF\n".len();
    let container = PdfContainer::from_bytes(Bytes::from(single)).unwrap();
    assert_eq!(container.scan_range().end, marker);
}

#[test]
fn test_open_file_uses_mmap() {
    let mut data = pdf(&[stream_object(1, "/Filter /FlateDecode", &zlib(PAYLOAD))]);
    data.extend(std::iter::repeat_n(b'\n', 0x300));
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&data).unwrap();
    file.flush().unwrap();

    PdfContainer::probe(file.path()).unwrap();
    let container = PdfContainer::open(file.path()).unwrap();
    assert!(matches!(container.bytes(), PdfBytes::Shared(_)));
    assert!(container.modified().is_some());
    assert_eq!(container.next_object().unwrap().unwrap().data().as_ref(), PAYLOAD);
}

#[test]
fn test_open_rejects_small_files() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&pdf(&[stream_object(1, "", b"tiny")])).unwrap();
    file.flush().unwrap();

    assert!(matches!(PdfContainer::open(file.path()), Err(CarveError::FormatMismatch(_))));
    assert!(matches!(PdfContainer::probe(file.path()), Err(CarveError::FormatMismatch(_))));

    let relaxed = ScanOptions::default().with_min_file_size(0);
    let container = PdfContainer::open_with_options(file.path(), relaxed).unwrap();
    assert_eq!(container.scan_all().unwrap().len(), 1);
}
