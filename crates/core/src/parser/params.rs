//! Key lookup over the raw text of an object dictionary.
//!
//! Values are read straight out of the `<< ... >>` bytes instead of a parsed
//! tree: damaged files carry duplicate keys, stray tokens and unbalanced
//! arrays that a strict parser would reject. The first textual occurrence
//! of a key wins, including occurrences inside nested dictionaries such as
//! `/DecodeParms`. PDF name escapes (`#xx`) are not interpreted.

/// Raw dictionary text of one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectParams<'a> {
    raw: &'a [u8],
}

impl<'a> ObjectParams<'a> {
    pub const fn new(raw: &'a [u8]) -> Self {
        Self { raw }
    }

    /// Position of the value that follows `name`.
    ///
    /// The key must be followed by whitespace, or by `/` or `[` when
    /// `string_begin_allowed` is set. Occurrences that are merely a prefix
    /// of a longer key (`/Length` in `/Length1`) are skipped.
    fn value_position(&self, name: &[u8], string_begin_allowed: bool) -> Option<usize> {
        if name.is_empty() {
            return None;
        }
        let mut from = 0;
        while let Some(found) = find_subslice(&self.raw[from..], name) {
            let after = from + found + name.len();
            match self.raw.get(after) {
                Some(&b) if (0x09..=0x20).contains(&b) => {
                    return Some(skip_whitespace(self.raw, after));
                }
                Some(b'/' | b'[') if string_begin_allowed => return Some(after),
                _ => from = after,
            }
        }
        None
    }

    /// Integer value of `name`, or `None` when the key is missing or its
    /// value does not parse.
    ///
    /// Accepts an optional leading minus and decimal digits. With
    /// `allow_bool`, `true`/`false` (any case) read as 1/0.
    pub fn find_int(&self, name: &str, allow_bool: bool) -> Option<i64> {
        let pos = self.value_position(name.as_bytes(), false)?;
        let value = &self.raw[pos..];
        if let Some(n) = parse_int(value) {
            return Some(n);
        }
        if allow_bool {
            return parse_bool(value);
        }
        None
    }

    /// Integer value of `name`, falling back to `default`.
    pub fn get_int(&self, name: &str, default: i64, allow_bool: bool) -> i64 {
        self.find_int(name, allow_bool).unwrap_or(default)
    }

    /// Boolean value of `name` (any non-zero integer counts as true).
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.find_int(name, true).map_or(default, |v| v != 0)
    }

    /// Name or array text of `name`.
    ///
    /// A `/Name` token yields the slash plus its alphanumeric run; an array
    /// yields the body between `[` and `]` (or the end of the text). At most
    /// `capacity` bytes are returned.
    pub fn find_string(&self, name: &str, capacity: usize) -> Option<&'a [u8]> {
        let pos = self.value_position(name.as_bytes(), true)?;
        let rest = &self.raw[pos..];

        if let Some(body) = rest.strip_prefix(b"[") {
            let end = body.iter().position(|&b| b == b']').unwrap_or(body.len());
            return Some(&body[..end.min(capacity)]);
        }
        if rest.first() != Some(&b'/') {
            return None;
        }
        let len = 1 + rest[1..]
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric())
            .count();
        Some(&rest[..len.min(capacity)])
    }

    /// Name or array text of `name`, falling back to `default`.
    pub fn get_string(&self, name: &str, default: &'a [u8], capacity: usize) -> &'a [u8] {
        self.find_string(name, capacity).unwrap_or(default)
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn skip_whitespace(data: &[u8], mut pos: usize) -> usize {
    while pos < data.len() && matches!(data[pos], b' ' | b'\t' | b'\r' | b'\n') {
        pos += 1;
    }
    pos
}

fn parse_int(value: &[u8]) -> Option<i64> {
    let (negative, digits) = match value.first() {
        Some(b'-') => (true, &value[1..]),
        _ => (false, value),
    };
    let count = digits.iter().take_while(|b| b.is_ascii_digit()).count();
    if count == 0 {
        return None;
    }
    let mut n: i64 = 0;
    for &d in &digits[..count] {
        n = n.checked_mul(10)?.checked_add(i64::from(d - b'0'))?;
    }
    Some(if negative { -n } else { n })
}

fn parse_bool(value: &[u8]) -> Option<i64> {
    if value.len() >= 4 && value[..4].eq_ignore_ascii_case(b"true") {
        Some(1)
    } else if value.len() >= 5 && value[..5].eq_ignore_ascii_case(b"false") {
        Some(0)
    } else {
        None
    }
}
