//! PDF container: the byte image plus the objects recovered from it.

use std::fs::File;
use std::io::ErrorKind;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use bytes::Bytes;
use memmap2::Mmap;
use tracing::debug;

use crate::buffer::ByteCursor;
use crate::document::filter::{decode_chain, resolve_filters};
use crate::document::object::{PdfObject, parse_object_id};
use crate::error::{CarveError, Result};
use crate::options::ScanOptions;
use crate::parser::{ObjectScanner, RawStream};

const SIGNATURE: &[u8] = b"%PDF-1.";
const EOF_MARKER: &[u8] = b"%%EOF";

/// Backing storage of a PDF image.
#[derive(Debug, Clone)]
pub enum PdfBytes {
    /// Copied into an owned buffer.
    Owned(Bytes),
    /// Shared with the caller or a memory map, never copied.
    Shared(Bytes),
}

impl PdfBytes {
    pub const fn as_bytes(&self) -> &Bytes {
        match self {
            Self::Owned(data) | Self::Shared(data) => data,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        self.as_bytes().as_ref()
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

#[derive(Debug, Default)]
struct ScanState {
    cursor: usize,
    objects: Vec<Arc<PdfObject>>,
}

/// A PDF image and the objects recovered from it so far.
///
/// The container is shared as `Arc<PdfContainer>`. Scanning is lazy: each
/// [`next_object`](Self::next_object) call advances a shared cursor to the
/// next decodable stream. Calls from several threads are serialized.
#[derive(Debug)]
pub struct PdfContainer {
    data: PdfBytes,
    range: Range<usize>,
    modified: Option<SystemTime>,
    options: ScanOptions,
    state: Mutex<ScanState>,
}

impl PdfContainer {
    /// Map `path` and prepare it for scanning.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        Self::open_with_options(path, ScanOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ScanOptions) -> Result<Arc<Self>> {
        let (mmap, modified) = map_file(path.as_ref(), &options)?;
        let data = PdfBytes::Shared(Bytes::from_owner(mmap));
        Self::build(data, modified, options)
    }

    /// Wrap bytes already in memory (zero-copy). No minimum size applies.
    pub fn from_bytes(data: Bytes) -> Result<Arc<Self>> {
        Self::from_bytes_with_options(data, ScanOptions::default())
    }

    pub fn from_bytes_with_options(data: Bytes, options: ScanOptions) -> Result<Arc<Self>> {
        Self::build(PdfBytes::Shared(data), None, options)
    }

    /// Copy `data` into an owned image.
    pub fn from_slice(data: &[u8]) -> Result<Arc<Self>> {
        Self::build(
            PdfBytes::Owned(Bytes::copy_from_slice(data)),
            None,
            ScanOptions::default(),
        )
    }

    /// Run the open-time checks on a file without building a container.
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::probe_with_options(path, &ScanOptions::default())
    }

    pub fn probe_with_options<P: AsRef<Path>>(path: P, options: &ScanOptions) -> Result<()> {
        let (mmap, _) = map_file(path.as_ref(), options)?;
        scan_range(&mmap, options).map(|_| ())
    }

    /// Run the signature, header line and `%%EOF` checks on in-memory bytes.
    pub fn probe_bytes(data: &[u8]) -> Result<()> {
        scan_range(data, &ScanOptions::default()).map(|_| ())
    }

    fn build(data: PdfBytes, modified: Option<SystemTime>, options: ScanOptions) -> Result<Arc<Self>> {
        let range = scan_range(data.as_slice(), &options)?;
        debug!(len = data.len(), start = range.start, end = range.end, "opened pdf image");
        Ok(Arc::new(Self {
            state: Mutex::new(ScanState {
                cursor: range.start,
                objects: Vec::new(),
            }),
            data,
            range,
            modified,
            options,
        }))
    }

    fn lock(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub const fn bytes(&self) -> &PdfBytes {
        &self.data
    }

    /// Byte range that is searched for objects: from the line after the
    /// `%PDF-1.x` header up to `%%EOF`.
    pub fn scan_range(&self) -> Range<usize> {
        self.range.clone()
    }

    pub const fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Modification time of the source file; `None` for in-memory images.
    pub const fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    /// Scan forward to the next stream that decodes.
    ///
    /// Returns `Ok(None)` once the image is exhausted. Malformed objects are
    /// skipped. An allocation failure is returned for the object that caused
    /// it; the scan resumes after that object on the next call.
    pub fn next_object(&self) -> Result<Option<Arc<PdfObject>>> {
        let mut state = self.lock();
        let image = &self.data.as_slice()[..self.range.end];
        let mut scanner = ObjectScanner::at(image, state.cursor, self.options);

        loop {
            let found = scanner.next_stream();
            state.cursor = scanner.position();
            let Some(raw) = found else {
                return Ok(None);
            };
            match self.decode(&raw) {
                Ok(object) => {
                    let object = Arc::new(object);
                    state.objects.push(Arc::clone(&object));
                    return Ok(Some(object));
                }
                Err(e) if e.is_recoverable() => {
                    debug!(objid = raw.objid, offset = raw.offset, reason = %e, "discarding object");
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn decode(&self, raw: &RawStream) -> Result<PdfObject> {
        let image = self.data.as_bytes();
        let params = raw.params(image);
        let filters = resolve_filters(&params, &self.options);
        let payload = image.slice(raw.payload.clone());
        let data = decode_chain(payload, &filters, &params)?;
        Ok(PdfObject::new(raw.objid, filters, data, raw.payload_len()))
    }

    /// Iterate over the remaining objects, scanning as it goes.
    pub fn iter(&self) -> Objects<'_> {
        Objects { container: self }
    }

    /// Scan the rest of the image and return every object recovered so far.
    pub fn scan_all(&self) -> Result<Vec<Arc<PdfObject>>> {
        while self.next_object()?.is_some() {}
        Ok(self.objects())
    }

    /// Snapshot of the objects recovered so far, in scan order.
    pub fn objects(&self) -> Vec<Arc<PdfObject>> {
        self.lock().objects.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().objects.is_empty()
    }

    /// Find an already recovered object by its generated name.
    ///
    /// Only the id is taken from the name; the first object with that id
    /// wins.
    pub fn lookup_by_name(&self, name: &str) -> Option<Arc<PdfObject>> {
        let objid = parse_object_id(name)?;
        self.lock()
            .objects
            .iter()
            .find(|object| object.objid() == objid)
            .cloned()
    }

    /// Write the named object to `dir/<name>` and return the path.
    pub fn extract_to<P: AsRef<Path>>(&self, name: &str, dir: P) -> Result<PathBuf> {
        let object = self.lookup_by_name(name).ok_or_else(|| not_found(name))?;
        let path = dir.as_ref().join(object.name());
        let mut file = File::create(&path)?;
        object.write_to(&mut file)?;
        Ok(path)
    }

    /// Copy of the named object's decoded bytes.
    pub fn extract_to_memory(&self, name: &str) -> Result<Vec<u8>> {
        let object = self.lookup_by_name(name).ok_or_else(|| not_found(name))?;
        let mut out = Vec::new();
        out.try_reserve_exact(object.unpacked_size())
            .map_err(|e| CarveError::alloc(object.unpacked_size(), e))?;
        object.write_to(&mut out)?;
        Ok(out)
    }

    /// Drop the container's handles to the recovered objects. Handles held
    /// elsewhere stay valid; scanning continues where it stopped.
    pub fn close(&self) {
        self.lock().objects.clear();
    }
}

/// Iterator returned by [`PdfContainer::iter`].
pub struct Objects<'a> {
    container: &'a PdfContainer,
}

impl Iterator for Objects<'_> {
    type Item = Result<Arc<PdfObject>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.container.next_object().transpose()
    }
}

fn not_found(name: &str) -> CarveError {
    CarveError::Io(std::io::Error::new(
        ErrorKind::NotFound,
        format!("no recovered object named {name}"),
    ))
}

fn map_file(path: &Path, options: &ScanOptions) -> Result<(Mmap, Option<SystemTime>)> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    if metadata.len() < options.min_file_size as u64 {
        return Err(CarveError::FormatMismatch(format!(
            "{} bytes is below the {} byte minimum",
            metadata.len(),
            options.min_file_size
        )));
    }
    // Safety: the map is read-only and the file stays open while it lives.
    let mmap = unsafe { Mmap::map(&file)? };
    Ok((mmap, metadata.modified().ok()))
}

/// Check the signature and locate the searchable range.
fn scan_range(data: &[u8], options: &ScanOptions) -> Result<Range<usize>> {
    if !data.starts_with(SIGNATURE) {
        return Err(CarveError::FormatMismatch("missing %PDF-1. signature".into()));
    }
    let mut cursor = ByteCursor::new(data);
    let start = cursor
        .find_end_of_line()
        .ok_or_else(|| CarveError::FormatMismatch("unterminated header line".into()))?;
    let end = find_eof_marker(data, options.eof_search_window);
    if end <= start {
        return Err(CarveError::FormatMismatch("no data after header".into()));
    }
    Ok(start..end)
}

/// Offset of a `%%EOF` marker near the end, or the end of the data.
fn find_eof_marker(data: &[u8], window: usize) -> usize {
    let Some(last) = data.len().checked_sub(EOF_MARKER.len()) else {
        return data.len();
    };
    (0..window)
        .map_while(|back| last.checked_sub(back))
        .find(|&pos| data[pos..].starts_with(EOF_MARKER))
        .unwrap_or(data.len())
}
