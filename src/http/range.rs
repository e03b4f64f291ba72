//! HTTP Range request parsing module
//!
//! Single-range `Range` header parsing per RFC 7233, used when serving the
//! modeler's bundled assets.

/// Parsed byte range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteRange {
    /// Start byte position
    pub start: usize,
    /// End byte position, None means until end of file
    pub end: Option<usize>,
}

impl ByteRange {
    /// Actual inclusive end position for a file of the given size
    #[inline]
    pub fn end_position(&self, file_size: usize) -> usize {
        self.end.unwrap_or_else(|| file_size.saturating_sub(1))
    }

    #[cfg(test)]
    pub fn content_length(&self, file_size: usize) -> usize {
        self.end_position(file_size).saturating_sub(self.start) + 1
    }
}

/// Range header parse result
#[derive(Debug)]
pub enum RangeParseResult {
    /// Valid range request
    Valid(ByteRange),
    /// Start lies beyond the file, respond 416
    NotSatisfiable,
    /// No Range header, non-bytes unit, or malformed: serve the full content
    None,
}

/// Parse an HTTP Range header (single range, bytes unit only)
///
/// Supported forms:
/// - `bytes=start-end`
/// - `bytes=start-`
/// - `bytes=-suffix` (last `suffix` bytes)
pub fn parse_range_header(range_header: Option<&str>, file_size: usize) -> RangeParseResult {
    let Some(header) = range_header else {
        return RangeParseResult::None;
    };

    let Some(value) = header.strip_prefix("bytes=") else {
        return RangeParseResult::None;
    };

    // Multi-range requests are ignored, full content is served instead
    if value.contains(',') {
        return RangeParseResult::None;
    }

    let Some((start_str, end_str)) = value.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        return parse_suffix_range(end_str, file_size);
    }

    parse_standard_range(start_str, end_str, file_size)
}

/// Suffix form, e.g. `-500` for the trailing 500 bytes
fn parse_suffix_range(suffix_str: &str, file_size: usize) -> RangeParseResult {
    let Ok(suffix) = suffix_str.parse::<usize>() else {
        return RangeParseResult::None;
    };

    if suffix == 0 {
        return RangeParseResult::NotSatisfiable;
    }

    // A suffix longer than the file simply covers the whole file
    let start = file_size.saturating_sub(suffix);
    RangeParseResult::Valid(ByteRange {
        start,
        end: Some(file_size.saturating_sub(1)),
    })
}

/// Standard form, e.g. `0-99` or `100-`
fn parse_standard_range(start_str: &str, end_str: &str, file_size: usize) -> RangeParseResult {
    let Ok(start) = start_str.parse::<usize>() else {
        return RangeParseResult::None;
    };

    if start >= file_size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        None
    } else {
        let Ok(e) = end_str.parse::<usize>() else {
            return RangeParseResult::None;
        };
        // Clamp to the last valid byte
        Some(e.min(file_size - 1))
    };

    if let Some(e) = end {
        if start > e {
            return RangeParseResult::NotSatisfiable;
        }
    }

    RangeParseResult::Valid(ByteRange { start, end })
}
