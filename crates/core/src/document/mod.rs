//! Recovered-object model.
//!
//! This module contains:
//! - `container` - the PDF image, its scan cursor and recovered objects (PdfContainer)
//! - `filter` - filter-chain resolution and the decode pipeline
//! - `object` - one decoded stream with its name and extension (PdfObject)

pub mod container;
pub mod filter;
pub mod object;

pub use container::{Objects, PdfBytes, PdfContainer};
pub use filter::{FilterChain, FilterTag, decode_chain, resolve_filters};
pub use object::{PdfObject, parse_object_id, sniff_extension};
