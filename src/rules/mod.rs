//! Content preservation rules.
//!
//! Each rule pairs a path predicate with a merge of (old destination content,
//! new staged content). Rules are tried in a fixed order and the first match
//! wins. A rule that cannot parse its input is skipped and the staged content
//! passes through verbatim.

pub mod copyright;
pub mod metadata;
pub mod snippet;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::OwlBotError;

pub use metadata::{LibraryTypePolicy, REPO_METADATA_FILE};

/// Inputs some rules need beyond the two file contents.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    /// Name of the unit (gem) being reconciled.
    pub unit_name: &'a str,
    /// Whether the previously loaded manifest tracks any static paths.
    pub has_static_files: bool,
    pub policy: &'a LibraryTypePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    RepoMetadata,
    SnippetMetadata,
    CopyrightHeader,
}

/// Evaluation order.
pub const RULES: [Rule; 3] = [Rule::RepoMetadata, Rule::SnippetMetadata, Rule::CopyrightHeader];

impl Rule {
    /// First rule whose predicate accepts `rel`.
    pub fn for_path(rel: &str) -> Option<Rule> {
        RULES.into_iter().find(|r| r.matches(rel))
    }

    pub fn matches(&self, rel: &str) -> bool {
        let name = basename(rel);
        match self {
            Rule::RepoMetadata => name == REPO_METADATA_FILE,
            Rule::SnippetMetadata => snippet::matches(name),
            Rule::CopyrightHeader => copyright::matches(rel),
        }
    }

    /// `Ok(None)` means "leave the staged content as it is".
    pub fn merge(
        &self,
        rel: &str,
        old: Option<&str>,
        new: &str,
        ctx: &RuleContext<'_>,
    ) -> Result<Option<String>, OwlBotError> {
        match self {
            Rule::RepoMetadata => metadata::merge(rel, old, new, ctx),
            Rule::SnippetMetadata => snippet::merge(rel, old, new),
            Rule::CopyrightHeader => Ok(copyright::merge(old, new)),
        }
    }
}

/// Run the matching rule (if any) over raw file bytes.
pub fn preserve(rel: &str, old: Option<&[u8]>, new: Vec<u8>, ctx: &RuleContext<'_>) -> Vec<u8> {
    let Some(rule) = Rule::for_path(rel) else {
        return new;
    };
    let Ok(new_text) = std::str::from_utf8(&new) else {
        debug!(path = rel, ?rule, "staged content is not UTF-8; rule skipped");
        return new;
    };
    let old_text = old.and_then(|o| std::str::from_utf8(o).ok());

    match rule.merge(rel, old_text, new_text, ctx) {
        Ok(Some(merged)) => {
            debug!(path = rel, ?rule, "preservation rule applied");
            merged.into_bytes()
        }
        Ok(None) => new,
        Err(e) => {
            warn!(path = rel, ?rule, error = %e, "preservation rule skipped");
            new
        }
    }
}

fn basename(rel: &str) -> &str {
    rel.rsplit('/').next().unwrap_or(rel)
}

pub(crate) fn parse_object(rel: &str, text: &str) -> Result<Map<String, Value>, OwlBotError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(OwlBotError::MergeRule {
            path: rel.to_string(),
            reason: "top-level JSON value is not an object".into(),
        }),
        Err(e) => Err(OwlBotError::MergeRule {
            path: rel.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Pretty-print `value` using the indentation found in `original`, keeping
/// its trailing newline (or lack of one).
pub(crate) fn render_like(rel: &str, original: &str, value: &Value) -> Result<String, OwlBotError> {
    let indent = detect_indent(original);
    let mut buf = Vec::with_capacity(original.len() + 16);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser).map_err(|e| OwlBotError::MergeRule {
        path: rel.to_string(),
        reason: e.to_string(),
    })?;
    let mut out = String::from_utf8(buf).map_err(|e| OwlBotError::MergeRule {
        path: rel.to_string(),
        reason: e.to_string(),
    })?;
    if original.ends_with('\n') {
        out.push('\n');
    }
    Ok(out)
}

fn detect_indent(text: &str) -> String {
    text.lines()
        .skip(1)
        .find_map(|line| {
            let ws: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
            (!ws.is_empty() && ws.len() < line.len()).then_some(ws)
        })
        .unwrap_or_else(|| "  ".to_string())
}
