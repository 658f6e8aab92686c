//! Object discovery over raw PDF bytes.
//!
//! - `params`: key lookup over raw dictionary text
//! - `scanner`: line-oriented search for stream objects

pub mod params;
pub mod scanner;

pub use params::ObjectParams;
pub use scanner::{ObjectScanner, RawStream, StreamEnd};
