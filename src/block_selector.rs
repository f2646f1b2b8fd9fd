//! Shallow block scanner for generated Ruby source.
//!
//! Nesting is tracked line by line: a line whose first word is one of a small
//! set of scope keywords (or that ends in `do` / `do |args|`) opens a scope, a
//! line whose first word is `end` closes one. Indentation is ignored. This is
//! not a parser: keywords inside heredocs or multi-line strings will confuse
//! it. The generated files it runs over have a predictable shape.

use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

const OPENERS: &[&str] = &[
    "def", "module", "class", "begin", "if", "unless", "case", "while", "until", "for",
];

static TRAILING_DO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bdo(\s*\|[^|]*\|)?\s*$").expect("static regex"));
static TRAILING_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[;\s]end\s*$").expect("static regex"));
static ENDLESS_DEF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^def\s+[\w.?!]+(\([^)]*\))?\s*=[^=~>]").expect("static regex"));

fn first_word(line: &str) -> &str {
    let trimmed = line.trim_start();
    let end = trimmed
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

fn is_comment(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

fn opens(line: &str) -> bool {
    if is_comment(line) {
        return false;
    }
    OPENERS.contains(&first_word(line)) || TRAILING_DO.is_match(line.trim_end())
}

/// Net nesting change contributed by one line.
fn depth_delta(line: &str) -> i32 {
    if is_comment(line) {
        return 0;
    }
    let body = line.trim();
    if first_word(body) == "end" {
        return -1;
    }
    if opens(body) {
        // one-liners such as `def foo; end` or `def foo = 1`
        if TRAILING_END.is_match(body) || ENDLESS_DEF.is_match(body) {
            return 0;
        }
        return 1;
    }
    0
}

/// A located block (or the absence of one) within a piece of source text.
#[derive(Debug, Clone)]
pub struct Selection<'a> {
    content: &'a str,
    lines: Vec<&'a str>,
    span: Option<(usize, usize)>,
}

impl<'a> Selection<'a> {
    pub fn found(&self) -> bool {
        self.span.is_some()
    }

    /// Zero-based, inclusive line range of the block.
    pub fn line_range(&self) -> Option<RangeInclusive<usize>> {
        self.span.map(|(s, e)| s..=e)
    }

    /// The block's text, opening and closing lines included.
    pub fn text(&self) -> Option<String> {
        self.span.map(|(s, e)| self.lines[s..=e].concat())
    }

    /// New content with the block removed. Also drops one adjacent blank line
    /// (the following one if present, otherwise the preceding one) so the
    /// surrounding code keeps single blank-line separation. Returns the
    /// original content unchanged when nothing was selected.
    pub fn delete(&self) -> String {
        let Some((start, end)) = self.span else {
            return self.content.to_string();
        };
        let is_blank = |i: usize| self.lines.get(i).is_some_and(|l| l.trim().is_empty());

        let (mut from, mut to) = (start, end);
        if is_blank(end + 1) {
            to = end + 1;
        } else if start > 0 && is_blank(start - 1) {
            from = start - 1;
        }

        let mut out = String::with_capacity(self.content.len());
        for (i, line) in self.lines.iter().enumerate() {
            if i < from || i > to {
                out.push_str(line);
            }
        }
        out
    }
}

/// Find the first line that opens a scope and contains `header`, and the line
/// that closes it. An unterminated block counts as not found.
pub fn select_block<'a>(content: &'a str, header: &str) -> Selection<'a> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();

    let span = lines
        .iter()
        .position(|l| opens(l) && l.contains(header))
        .and_then(|start| {
            let mut depth = 0i32;
            for (i, line) in lines.iter().enumerate().skip(start) {
                depth += depth_delta(line);
                if depth <= 0 {
                    return Some((start, i));
                }
            }
            None
        });

    Selection {
        content,
        lines,
        span,
    }
}

/// Chainable wrapper for modifier code: `SourceText::new(src).select_block("def x").delete()`.
#[derive(Debug, Clone)]
pub struct SourceText<'a>(&'a str);

impl<'a> SourceText<'a> {
    pub fn new(content: &'a str) -> Self {
        Self(content)
    }

    pub fn select_block(&self, header: &str) -> Selection<'a> {
        select_block(self.0, header)
    }
}
