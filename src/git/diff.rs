//! Text diffing of file contents between two commits.
//!
//! Contents are re-indented with tabs before comparison so that formatting
//! differences do not show up as changes. Re-indenting only touches whitespace
//! between tokens; strings, numbers and duplicate keys are kept exactly as
//! written. The comparison itself is `similar`'s character-level Myers diff,
//! folded into `DiffSegment`s.

use serde::de::IgnoredAny;
use similar::{ChangeTag, TextDiff};
use std::iter::Peekable;
use std::str::Chars;

use crate::error::{AppError, Result};
use crate::models::{DiffSegment, SegmentKind};

/// Re-indent a JSON document with tabs, one member or element per line.
pub fn pretty_json(raw: &str, what: &str) -> Result<String> {
    serde_json::from_str::<IgnoredAny>(raw).map_err(|source| AppError::Format {
        what: what.to_string(),
        source,
    })?;

    let mut out = String::with_capacity(raw.len() * 2);
    let mut depth = 0usize;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' => copy_string(&mut chars, &mut out),
            '{' | '[' => {
                out.push(c);
                skip_whitespace(&mut chars);
                match chars.peek() {
                    Some(&close @ ('}' | ']')) => {
                        out.push(close);
                        chars.next();
                    }
                    _ => {
                        depth += 1;
                        newline(&mut out, depth);
                    }
                }
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                newline(&mut out, depth);
                out.push(c);
            }
            ',' => {
                out.push(',');
                newline(&mut out, depth);
            }
            ':' => out.push_str(": "),
            ' ' | '\t' | '\n' | '\r' => {}
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Copy the rest of a string literal whose opening quote was already consumed.
fn copy_string(chars: &mut Peekable<Chars<'_>>, out: &mut String) {
    out.push('"');
    while let Some(c) = chars.next() {
        out.push(c);
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '"' => return,
            _ => {}
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while matches!(chars.peek(), Some(' ' | '\t' | '\n' | '\r')) {
        chars.next();
    }
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push('\t');
    }
}

/// Ordered segments turning `old` into `new`.
///
/// Changes between two unchanged runs are grouped into at most one `Delete`
/// followed by at most one `Insert`.
pub fn diff_segments(old: &str, new: &str) -> Vec<DiffSegment> {
    let diff = TextDiff::from_chars(old, new);

    let mut segments: Vec<DiffSegment> = Vec::new();
    let mut deleted = String::new();
    let mut inserted = String::new();

    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Delete => deleted.push_str(change.value()),
            ChangeTag::Insert => inserted.push_str(change.value()),
            ChangeTag::Equal => {
                flush_changes(&mut segments, &mut deleted, &mut inserted);
                match segments.last_mut() {
                    Some(last) if last.kind == SegmentKind::Equal => {
                        last.text.push_str(change.value())
                    }
                    _ => segments.push(DiffSegment::new(SegmentKind::Equal, change.value())),
                }
            }
        }
    }
    flush_changes(&mut segments, &mut deleted, &mut inserted);

    segments
}

fn flush_changes(segments: &mut Vec<DiffSegment>, deleted: &mut String, inserted: &mut String) {
    if !deleted.is_empty() {
        segments.push(DiffSegment::new(SegmentKind::Delete, std::mem::take(deleted)));
    }
    if !inserted.is_empty() {
        segments.push(DiffSegment::new(SegmentKind::Insert, std::mem::take(inserted)));
    }
}
