//! `snippet_metadata*.json`: the gem version recorded under
//! `client_library.version` is owned by the release process, not the generator.

use glob::Pattern;
use serde_json::Value;
use std::sync::LazyLock;

use super::{parse_object, render_like};
use crate::errors::OwlBotError;

static SNIPPET_METADATA: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new("snippet_metadata*.json").expect("static glob"));

pub(super) fn matches(file_name: &str) -> bool {
    SNIPPET_METADATA.matches(file_name)
}

pub(super) fn merge(rel: &str, old: Option<&str>, new: &str) -> Result<Option<String>, OwlBotError> {
    let Some(old) = old else {
        return Ok(None);
    };
    let existing = parse_object(rel, old)?;
    let Some(version) = existing
        .get("client_library")
        .and_then(|c| c.get("version"))
        .cloned()
    else {
        return Ok(None);
    };

    let mut incoming = parse_object(rel, new)?;
    let Some(Value::Object(client)) = incoming.get_mut("client_library") else {
        return Ok(None);
    };
    if client.get("version") == Some(&version) {
        return Ok(None);
    }
    client.insert("version".into(), version);

    render_like(rel, new, &Value::Object(incoming)).map(Some)
}
