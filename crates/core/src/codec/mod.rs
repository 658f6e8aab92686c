//! Stream filter decoders.
//!
//! This module contains:
//! - `ascii85`: ASCII85 and ASCIIHex decoding
//! - `ccitt`: CCITT payload wrapping into a single-strip TIFF
//! - `flate`: Flate (zlib / raw deflate) decoding
//! - `lzw`: LZW decoding
//! - `runlength`: Run-length decoding
//!
//! Every decoder takes the whole input and returns a freshly allocated output.

pub mod ascii85;
pub mod ccitt;
pub mod flate;
pub mod lzw;
pub mod runlength;

pub use ascii85::{ascii85decode, asciihexdecode};
pub use ccitt::{CcittParams, TIFF_HEADER_LEN, ccitt_wrap};
pub use flate::flatedecode;
pub use lzw::{lzwdecode, lzwdecode_with_earlychange};
pub use runlength::rldecode;
