//! Scan tunables.

/// Longest filter chain the scanner resolves.
pub const MAX_FILTERS: usize = 8;

/// Options for opening and scanning a PDF image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Smallest file accepted by the file-backed constructors.
    pub min_file_size: usize,
    /// How many positions before the end are tried for `%%EOF`.
    pub eof_search_window: usize,
    /// Longest line considered as an object header.
    pub max_header_line: usize,
    /// Most bytes read from a `/Filter` or `/Subtype` value.
    pub filter_text_capacity: usize,
    /// Longest filter chain; capped at [`MAX_FILTERS`].
    pub max_filters: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            min_file_size: 0x300,
            eof_search_window: 32,
            max_header_line: 256,
            filter_text_capacity: 64,
            max_filters: MAX_FILTERS,
        }
    }
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_min_file_size(mut self, size: usize) -> Self {
        self.min_file_size = size;
        self
    }

    pub const fn with_eof_search_window(mut self, window: usize) -> Self {
        self.eof_search_window = window;
        self
    }

    pub const fn with_max_header_line(mut self, len: usize) -> Self {
        self.max_header_line = len;
        self
    }

    pub const fn with_filter_text_capacity(mut self, capacity: usize) -> Self {
        self.filter_text_capacity = capacity;
        self
    }

    pub fn with_max_filters(mut self, count: usize) -> Self {
        self.max_filters = count.min(MAX_FILTERS);
        self
    }
}
