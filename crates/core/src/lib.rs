//! pdfcarve - best-effort recovery of embedded stream objects from PDF files.
//!
//! The scanner walks the raw bytes instead of the cross-reference table, so
//! damaged and truncated files still give up whatever streams they contain.
//!
//! ```no_run
//! use pdfcarve_core::PdfContainer;
//!
//! let pdf = PdfContainer::open("input.pdf")?;
//! for object in pdf.iter() {
//!     let object = object?;
//!     println!("{} {} bytes", object.name(), object.unpacked_size());
//! }
//! # Ok::<(), pdfcarve_core::CarveError>(())
//! ```

pub mod buffer;
pub mod codec;
pub mod document;
pub mod error;
pub mod options;
pub mod parser;

pub use buffer::{ByteBuffer, ByteCursor};
pub use document::{FilterChain, FilterTag, PdfBytes, PdfContainer, PdfObject};
pub use error::{CarveError, Result};
pub use options::ScanOptions;
pub use parser::{ObjectParams, ObjectScanner, RawStream};
