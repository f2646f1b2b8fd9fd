//! XML configuration support.
//! - Loads settings from config.xml (quick_xml).
//! - A missing file means defaults; a malformed one is an error naming the file.
//!
//! Unknown XML fields are rejected to surface misconfigurations early.
//!
//! ```xml
//! <config>
//!   <repo_dir>/src/google-cloud-ruby</repo_dir>
//!   <staging_root>owl-bot-staging</staging_root>
//!   <preserve>CHANGELOG.md</preserve>
//!   <preserve>lib/**/version.rb</preserve>
//!   <library_type pattern="-v\d+\w*$" auto="GAPIC_AUTO"/>
//!   <log_level>info</log_level>
//! </config>
//! ```

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::paths::default_config_path;
use crate::config::types::{Config, LogLevel};
use crate::rules::LibraryTypePolicy;
use crate::rules::metadata::DEFAULT_VERSIONED_NAME_PATTERN;

/// Struct mirroring the XML config for deserialization.
#[derive(Debug, Deserialize)]
#[serde(rename = "config")]
#[serde(deny_unknown_fields)]
struct XmlConfig {
    repo_dir: Option<String>,
    staging_root: Option<String>,
    manifest_name: Option<String>,
    script_name: Option<String>,
    #[serde(default)]
    preserve: Vec<String>,
    library_type: Option<XmlLibraryType>,
    log_level: Option<String>,
    log_file: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct XmlLibraryType {
    #[serde(rename = "@pattern")]
    pattern: Option<String>,
    #[serde(rename = "@sentinel")]
    sentinel: Option<String>,
    #[serde(rename = "@manual")]
    manual: Option<String>,
    #[serde(rename = "@auto")]
    auto: Option<String>,
    #[serde(rename = "@combo")]
    combo: Option<String>,
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl XmlLibraryType {
    fn into_policy(self) -> Result<LibraryTypePolicy> {
        let pattern = trimmed(self.pattern).unwrap_or_else(|| DEFAULT_VERSIONED_NAME_PATTERN.into());
        let mut policy = LibraryTypePolicy::new(&pattern)
            .with_context(|| format!("invalid library_type pattern '{pattern}'"))?;
        if let Some(v) = trimmed(self.sentinel) {
            policy.sentinel = v;
        }
        if let Some(v) = trimmed(self.manual) {
            policy.manual = v;
        }
        if let Some(v) = trimmed(self.auto) {
            policy.auto = v;
        }
        if let Some(v) = trimmed(self.combo) {
            policy.combo = v;
        }
        Ok(policy)
    }
}

// Map XmlConfig -> Config
fn xml_to_config(parsed: XmlConfig) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(s) = trimmed(parsed.repo_dir) {
        cfg.repo_dir = PathBuf::from(s);
    }
    if let Some(s) = trimmed(parsed.staging_root) {
        cfg.staging_root = PathBuf::from(s);
    }
    if let Some(s) = trimmed(parsed.manifest_name) {
        cfg.manifest_name = s;
    }
    if let Some(s) = trimmed(parsed.script_name) {
        cfg.script_name = s;
    }
    let preserve: Vec<String> = parsed
        .preserve
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();
    if !preserve.is_empty() {
        cfg.preserved_paths = preserve;
    }
    if let Some(lt) = parsed.library_type {
        cfg.library_type = lt.into_policy()?;
    }
    if let Some(s) = trimmed(parsed.log_level) {
        cfg.log_level = s
            .parse::<LogLevel>()
            .map_err(anyhow::Error::msg)
            .context("config log_level")?;
    }
    if let Some(s) = trimmed(parsed.log_file) {
        cfg.log_file = Some(PathBuf::from(s));
    }
    if let Some(json) = parsed.json {
        cfg.json = json;
    }
    Ok(cfg)
}

/// Load a Config from a specific XML file path (quick_xml).
pub fn load_config_from_xml_path(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read config xml '{}'", path.display()))?;
    let parsed: XmlConfig = from_xml_str(&contents)
        .with_context(|| format!("parse config xml '{}'", path.display()))?;
    xml_to_config(parsed).with_context(|| format!("config xml '{}'", path.display()))
}

/// Resolve the config file (`$OWLBOT_CONFIG` or the OS default) and load it.
/// Falls back to defaults when no file exists.
pub fn load_config() -> Result<Config> {
    let Some(path) = default_config_path() else {
        debug!("no config path could be determined; using defaults");
        return Ok(Config::default());
    };
    if !path.exists() {
        debug!(path = %path.display(), "config file not found; using defaults");
        return Ok(Config::default());
    }
    debug!(path = %path.display(), "loading config");
    load_config_from_xml_path(&path)
}
