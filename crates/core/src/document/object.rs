//! Recovered stream objects.

use std::io::Write;

use bytes::Bytes;

use crate::document::filter::{FilterChain, FilterTag};

/// Every recovered object is a stream.
pub const FILE_TYPE: &str = "stream";

/// Block size used when writing object data out.
pub const WRITE_BLOCK: usize = 64 * 1024;

/// One decoded stream object.
#[derive(Debug, Clone)]
pub struct PdfObject {
    objid: u32,
    filters: FilterChain,
    extension: &'static str,
    data: Bytes,
    packed_size: usize,
}

impl PdfObject {
    pub fn new(objid: u32, filters: FilterChain, data: Bytes, packed_size: usize) -> Self {
        let xml = filters.contains(&FilterTag::PlainXml);
        let extension = sniff_extension(&data, xml);
        Self {
            objid,
            filters,
            extension,
            data,
            packed_size,
        }
    }

    pub const fn objid(&self) -> u32 {
        self.objid
    }

    pub fn filters(&self) -> &[FilterTag] {
        &self.filters
    }

    /// Extension including the dot, e.g. `.jpg`.
    pub const fn extension(&self) -> &'static str {
        self.extension
    }

    pub const fn file_type(&self) -> &'static str {
        FILE_TYPE
    }

    /// `object-stream-<8-digit id><ext>`.
    pub fn name(&self) -> String {
        format!("object-{FILE_TYPE}-{:08}{}", self.objid, self.extension)
    }

    /// Payload size before decoding.
    pub const fn packed_size(&self) -> usize {
        self.packed_size
    }

    pub fn unpacked_size(&self) -> usize {
        self.data.len()
    }

    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Write the decoded bytes to `writer` in 64 KiB blocks.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<u64> {
        for block in self.data.chunks(WRITE_BLOCK) {
            writer.write_all(block)?;
        }
        writer.flush()?;
        Ok(self.data.len() as u64)
    }
}

/// Guess a file extension from the decoded bytes.
///
/// XML streams are always `.xml`; otherwise the leading magic decides.
pub fn sniff_extension(data: &[u8], xml: bool) -> &'static str {
    if xml {
        ".xml"
    } else if data.starts_with(b"II*\0") {
        ".tif"
    } else if data.starts_with(b"P4\n") {
        ".pbm"
    } else if data.starts_with(&[0xff, 0xd8, 0xff]) {
        ".jpg"
    } else if data.starts_with(b"%PDF-1.") {
        ".pdf"
    } else {
        ".dat"
    }
}

/// Object id encoded in a generated name: the digits between the last `-`
/// and the extension.
pub fn parse_object_id(name: &str) -> Option<u32> {
    let stem = match name.rfind('.') {
        Some(dot) => &name[..dot],
        None => name,
    };
    let dash = stem.rfind('-').filter(|&d| d > 0)?;
    let digits = &stem[dash + 1..];
    if digits.is_empty() || digits.len() > 10 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
