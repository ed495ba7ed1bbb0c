//! HTTP Range request parsing module
//!
//! Single `bytes=` ranges only (RFC 7233). Multi-range and unknown units are
//! answered with the full body.

/// Inclusive byte span inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub const fn content_length(&self) -> usize {
        self.end - self.start + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No usable Range header: send everything
    Full,
    Partial(ByteRange),
    /// 416
    Unsatisfiable,
}

/// Decide what part of a `size`-byte file a Range header asks for
pub fn evaluate_range(header: Option<&str>, size: usize) -> RangeOutcome {
    // An empty file has no satisfiable range; serve it whole instead of 416.
    if size == 0 {
        return RangeOutcome::Full;
    }
    let Some(ranges) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return RangeOutcome::Full;
    };
    if ranges.contains(',') {
        return RangeOutcome::Full;
    }
    let Some((first, last)) = ranges.split_once('-') else {
        return RangeOutcome::Full;
    };

    let last_index = size - 1;
    match (first.trim(), last.trim()) {
        ("", "") => RangeOutcome::Full,
        // bytes=-N: the final N bytes
        ("", suffix) => match suffix.parse::<usize>() {
            Ok(0) => RangeOutcome::Unsatisfiable,
            Ok(n) => RangeOutcome::Partial(ByteRange {
                start: size.saturating_sub(n),
                end: last_index,
            }),
            Err(_) => RangeOutcome::Full,
        },
        (start, end) => {
            let Ok(start) = start.parse::<usize>() else {
                return RangeOutcome::Full;
            };
            let end = if end.is_empty() {
                last_index
            } else {
                match end.parse::<usize>() {
                    Ok(e) => e.min(last_index),
                    Err(_) => return RangeOutcome::Full,
                }
            };

            if start > last_index || start > end {
                RangeOutcome::Unsatisfiable
            } else {
                RangeOutcome::Partial(ByteRange { start, end })
            }
        }
    }
}
