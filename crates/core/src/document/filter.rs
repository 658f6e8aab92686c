//! Filter-chain resolution and decoding.

use std::fmt;

use bytes::Bytes;
use smallvec::SmallVec;
use tracing::warn;

use crate::codec::{
    CcittParams, ascii85decode, asciihexdecode, ccitt_wrap, flatedecode,
    lzwdecode_with_earlychange, rldecode,
};
use crate::error::Result;
use crate::options::{MAX_FILTERS, ScanOptions};
use crate::parser::ObjectParams;

/// One decode stage of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterTag {
    /// No filter; bytes pass through.
    Plain,
    /// XML metadata stream; bytes pass through.
    PlainXml,
    Ascii85,
    AsciiHex,
    Flate,
    Lzw,
    RunLength,
    /// JPEG data, kept encoded.
    Dct,
    /// Fax data, wrapped in a TIFF.
    Ccitt,
}

/// Filters of one stream, in application order.
pub type FilterChain = SmallVec<[FilterTag; MAX_FILTERS]>;

impl FilterTag {
    /// Map a filter name (without the leading slash), short or long form.
    pub fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"FlateDecode" | b"Fl" => Some(Self::Flate),
            b"RunLengthDecode" | b"RL" => Some(Self::RunLength),
            b"ASCII85Decode" | b"A85" => Some(Self::Ascii85),
            b"ASCIIHexDecode" | b"AHx" => Some(Self::AsciiHex),
            b"CCITTFaxDecode" | b"CCF" => Some(Self::Ccitt),
            b"DCTDecode" | b"DCT" => Some(Self::Dct),
            b"LZWDecode" | b"LZW" => Some(Self::Lzw),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Plain => "Plain",
            Self::PlainXml => "XML",
            Self::Ascii85 => "ASCII85Decode",
            Self::AsciiHex => "ASCIIHexDecode",
            Self::Flate => "FlateDecode",
            Self::Lzw => "LZWDecode",
            Self::RunLength => "RunLengthDecode",
            Self::Dct => "DCTDecode",
            Self::Ccitt => "CCITTFaxDecode",
        }
    }

    /// Whether the stage leaves its input untouched.
    pub const fn is_passthrough(self) -> bool {
        matches!(self, Self::Plain | Self::PlainXml | Self::Dct)
    }
}

impl fmt::Display for FilterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Build the filter chain from `/Filter` and `/Subtype`.
///
/// Unknown names are ignored. An XML `/Subtype` overrides `/Filter`. A
/// stream with no usable filter gets `[Plain]`.
pub fn resolve_filters(params: &ObjectParams<'_>, options: &ScanOptions) -> FilterChain {
    let capacity = options.filter_text_capacity;
    let mut chain = FilterChain::new();

    let subtype = params.get_string("/Subtype", b"", capacity);
    if find(subtype, b"XML") {
        chain.push(FilterTag::PlainXml);
        return chain;
    }

    let limit = options.max_filters.min(MAX_FILTERS);
    let text = params.get_string("/Filter", b"", capacity);
    for name in filter_names(text) {
        if chain.len() == limit {
            break;
        }
        if let Some(tag) = FilterTag::from_name(name) {
            chain.push(tag);
        }
    }
    if chain.is_empty() {
        chain.push(FilterTag::Plain);
    }
    chain
}

/// Name tokens: a `/` followed by bytes in `'0'..='z'`.
fn filter_names(text: &[u8]) -> impl Iterator<Item = &[u8]> {
    text.split(|&b| b == b'/').skip(1).map(|token| {
        let len = token
            .iter()
            .take_while(|&&b| (b'0'..=b'z').contains(&b))
            .count();
        &token[..len]
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Apply `chain` to `payload`, left to right.
///
/// Pass-through stages keep sharing the input buffer. A CCITT stage ends the
/// chain.
pub fn decode_chain(payload: Bytes, chain: &[FilterTag], params: &ObjectParams<'_>) -> Result<Bytes> {
    let mut data = payload;
    for (stage, &tag) in chain.iter().enumerate() {
        let decoded = match tag {
            FilterTag::Plain | FilterTag::PlainXml | FilterTag::Dct => continue,
            FilterTag::Ascii85 => ascii85decode(&data),
            FilterTag::AsciiHex => asciihexdecode(&data),
            FilterTag::Flate => flatedecode(&data),
            FilterTag::RunLength => rldecode(&data),
            FilterTag::Lzw => {
                let early_change = params.get_int("/EarlyChange", 1, false);
                lzwdecode_with_earlychange(&data, i32::from(early_change != 0))
            }
            FilterTag::Ccitt => {
                let ccitt = CcittParams::from_params(params);
                return ccitt_wrap(&data, &ccitt).map(Bytes::from).inspect_err(|e| {
                    warn!(stage, filter = %tag, error = %e, "decode failed");
                });
            }
        };
        data = match decoded {
            Ok(out) => Bytes::from(out),
            Err(e) => {
                warn!(stage, filter = %tag, input_len = data.len(), error = %e, "decode failed");
                return Err(e);
            }
        };
    }
    Ok(data)
}
