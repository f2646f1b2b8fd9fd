//! `.repo-metadata.json`: keep the curated `release_level`, and resolve the
//! generator's `"library_type": "unknown"` placeholder.

use regex::Regex;
use serde_json::Value;

use super::{RuleContext, parse_object, render_like};
use crate::errors::OwlBotError;

pub const REPO_METADATA_FILE: &str = ".repo-metadata.json";

pub const DEFAULT_VERSIONED_NAME_PATTERN: &str = r"-v\d+\w*$";

/// Policy table for resolving the `library_type` placeholder.
///
/// | versioned name | has static files | result |
/// |---|---|---|
/// | no  | n/a | `manual` |
/// | yes | no  | `auto`   |
/// | yes | yes | `combo`  |
#[derive(Debug, Clone)]
pub struct LibraryTypePolicy {
    pub versioned_name: Regex,
    pub sentinel: String,
    pub manual: String,
    pub auto: String,
    pub combo: String,
}

impl Default for LibraryTypePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_VERSIONED_NAME_PATTERN).expect("default pattern compiles")
    }
}

impl LibraryTypePolicy {
    pub fn new(versioned_name_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            versioned_name: Regex::new(versioned_name_pattern)?,
            sentinel: "unknown".into(),
            manual: "GAPIC_MANUAL".into(),
            auto: "GAPIC_AUTO".into(),
            combo: "GAPIC_COMBO".into(),
        })
    }

    pub fn classify(&self, unit_name: &str, has_static_files: bool) -> &str {
        if !self.versioned_name.is_match(unit_name) {
            &self.manual
        } else if has_static_files {
            &self.combo
        } else {
            &self.auto
        }
    }

    /// Replacement for `incoming`, or None when it is already a concrete type.
    pub fn resolve(&self, incoming: &str, unit_name: &str, has_static_files: bool) -> Option<&str> {
        (incoming == self.sentinel).then(|| self.classify(unit_name, has_static_files))
    }
}

pub(super) fn merge(
    rel: &str,
    old: Option<&str>,
    new: &str,
    ctx: &RuleContext<'_>,
) -> Result<Option<String>, OwlBotError> {
    let mut incoming = parse_object(rel, new)?;
    let mut changed = false;

    if let Some(old) = old {
        let existing = parse_object(rel, old)?;
        if let Some(level) = existing.get("release_level")
            && incoming.get("release_level") != Some(level)
        {
            incoming.insert("release_level".into(), level.clone());
            changed = true;
        }
    }

    if let Some(Value::String(lib_type)) = incoming.get("library_type")
        && let Some(resolved) = ctx.policy.resolve(lib_type, ctx.unit_name, ctx.has_static_files)
    {
        let resolved = resolved.to_string();
        incoming.insert("library_type".into(), Value::String(resolved));
        changed = true;
    }

    if !changed {
        return Ok(None);
    }
    render_like(rel, new, &Value::Object(incoming)).map(Some)
}
