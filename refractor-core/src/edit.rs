//! Span-based text edits.
//!
//! A rewrite pass produces a batch of non-overlapping byte-range edits which
//! are spliced into the source in one scan. Overlap means the engine let two
//! rewrites race for the same bytes; that is reported as an error for the
//! file rather than emitting corrupt output.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub replacement: String,
}

#[derive(Error, Debug)]
pub enum EditError {
    #[error("overlapping edits {first_start}..{first_end} and {second_start}..{second_end}")]
    Overlap {
        first_start: usize,
        first_end: usize,
        second_start: usize,
        second_end: usize,
    },

    #[error("edit range {start}..{end} exceeds source length {len}")]
    OutOfBounds {
        start: usize,
        end: usize,
        len: usize,
    },
}

/// Applies the edits to `source`, returning the new text. Edits are sorted
/// by position first; exact duplicates collapse to one.
pub fn apply_edits(source: &str, mut edits: Vec<Edit>) -> Result<String, EditError> {
    if edits.is_empty() {
        return Ok(source.to_string());
    }

    edits.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
    edits.dedup();

    for edit in &edits {
        if edit.start > edit.end || edit.end > source.len() {
            return Err(EditError::OutOfBounds {
                start: edit.start,
                end: edit.end,
                len: source.len(),
            });
        }
    }
    for pair in edits.windows(2) {
        if pair[0].end > pair[1].start {
            return Err(EditError::Overlap {
                first_start: pair[0].start,
                first_end: pair[0].end,
                second_start: pair[1].start,
                second_end: pair[1].end,
            });
        }
    }

    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for edit in &edits {
        out.push_str(&source[last..edit.start]);
        out.push_str(&edit.replacement);
        last = edit.end;
    }
    out.push_str(&source[last..]);
    Ok(out)
}

/// Widens a statement-removal range so the deleted statement does not leave
/// a blank line behind. When the statement owns its whole line, the line's
/// indentation and terminator go with it; mid-line removals only swallow
/// trailing spaces.
pub fn widen_removal(source: &str, start: usize, end: usize) -> (usize, usize) {
    let bytes = source.as_bytes();

    let mut line_start = start;
    while line_start > 0 && matches!(bytes[line_start - 1], b' ' | b'\t') {
        line_start -= 1;
    }
    let at_line_start = line_start == 0 || bytes[line_start - 1] == b'\n';

    let mut new_end = end;
    while new_end < bytes.len() && matches!(bytes[new_end], b' ' | b'\t') {
        new_end += 1;
    }

    if at_line_start {
        let mut e = new_end;
        if e < bytes.len() && bytes[e] == b'\r' {
            e += 1;
        }
        if e < bytes.len() && bytes[e] == b'\n' {
            return (line_start, e + 1);
        }
    }
    (start, new_end)
}
