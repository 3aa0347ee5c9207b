//! HTML rendering of diff segments.
//!
//! Inserted text is wrapped in `<span class="added-code">`, deleted text in
//! `<span class="removed-code">`, unchanged text is copied as is. Segment
//! boundaries produced by a character diff can fall inside a tag or an entity
//! reference; such trailing fragments are carried over and glued onto the
//! next segment so highlight spans never cut through markup.

use crate::models::{DiffSegment, SegmentKind};

const ADDED_CODE_PREFIX: &str = r#"<span class="added-code">"#;
const REMOVED_CODE_PREFIX: &str = r#"<span class="removed-code">"#;
const CODE_TAG_SUFFIX: &str = "</span>";

pub fn render_html(segments: &[DiffSegment]) -> String {
    let mut out = String::new();
    let mut pending = String::new();

    for segment in segments {
        let mut text = std::mem::take(&mut pending);
        text.push_str(&segment.text);

        if let Some(at) = trailing_open_tag(&text).or_else(|| trailing_entity(&text)) {
            pending = text.split_off(at);
        }

        // A closing tag at the front belongs to the surrounding markup, emit it
        // before opening a highlight span of our own.
        let mut body = text.as_str();
        if let Some(rest) = body.strip_prefix(CODE_TAG_SUFFIX) {
            out.push_str(CODE_TAG_SUFFIX);
            body = rest;
        }

        // Still unbalanced: give up highlighting this segment rather than
        // emit broken markup.
        if body.matches('<').count() != body.matches('>').count() {
            out.push_str(body);
            continue;
        }

        match segment.kind {
            SegmentKind::Equal => out.push_str(body),
            SegmentKind::Insert => {
                out.push_str(ADDED_CODE_PREFIX);
                out.push_str(body);
                out.push_str(CODE_TAG_SUFFIX);
            }
            SegmentKind::Delete => {
                out.push_str(REMOVED_CODE_PREFIX);
                out.push_str(body);
                out.push_str(CODE_TAG_SUFFIX);
            }
        }
    }

    // Nothing left to glue an unterminated fragment onto, keep it as plain text.
    out.push_str(&pending);

    out
}

/// Start of an opening `<span` at the end of `text` that never reaches its `>`.
fn trailing_open_tag(text: &str) -> Option<usize> {
    let at = text.rfind("<span")?;
    let tail = &text[at + "<span".len()..];
    if tail.contains(['>', '<', '\n']) {
        None
    } else {
        Some(at)
    }
}

/// Start of an entity reference (`&name`, `&#123`) at the end of `text` that
/// is missing its `;`.
fn trailing_entity(text: &str) -> Option<usize> {
    let at = text.rfind('&')?;
    let name = text[at + 1..].trim_start_matches('#');
    if name.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(at)
    } else {
        None
    }
}
