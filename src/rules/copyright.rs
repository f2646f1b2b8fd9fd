//! Keep the original copyright year on Ruby sources.
//!
//! Only `.rb` files are covered; other languages with the same header shape
//! are copied as generated.

use regex::Regex;
use std::sync::LazyLock;

pub const PRESERVED_HEADER_EXTENSION: &str = "rb";

static COPYRIGHT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*Copyright\s+\d{4}\s+\S.*$").expect("static regex"));

pub(super) fn matches(rel: &str) -> bool {
    rel.rsplit('/')
        .next()
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(stem, ext)| !stem.is_empty() && ext == PRESERVED_HEADER_EXTENSION)
}

fn first_line_body(text: &str) -> &str {
    let line = text.split('\n').next().unwrap_or("");
    line.strip_suffix('\r').unwrap_or(line)
}

/// Swap the staged first line for the destination's when both are copyright lines.
pub(super) fn merge(old: Option<&str>, new: &str) -> Option<String> {
    let old_header = first_line_body(old?);
    let new_header = first_line_body(new);
    if old_header == new_header
        || !COPYRIGHT_LINE.is_match(old_header)
        || !COPYRIGHT_LINE.is_match(new_header)
    {
        return None;
    }
    let mut out = String::with_capacity(new.len());
    out.push_str(old_header);
    out.push_str(&new[new_header.len()..]);
    Some(out)
}
