//! Manifest store: the durable generated/static partition of a unit directory.
//!
//! On disk it is a JSON object with exactly two sorted string arrays:
//! `{"generated": [...], "static": [...]}`. A missing file loads as empty.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info};

pub const MANIFEST_FILE_NAME: &str = ".owlbot-manifest.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub generated: BTreeSet<String>,
    #[serde(default, rename = "static")]
    pub static_paths: BTreeSet<String>,
}

impl Manifest {
    pub fn new(generated: BTreeSet<String>, static_paths: BTreeSet<String>) -> Self {
        Self {
            generated,
            static_paths,
        }
    }

    /// Read the manifest at `path`; absence means an empty manifest.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no manifest yet; starting empty");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read manifest '{}'", path.display()));
            }
        };
        let manifest: Manifest = serde_json::from_str(&content)
            .with_context(|| format!("parse manifest '{}'", path.display()))?;
        Ok(manifest)
    }

    /// Write the manifest with sorted arrays and a trailing newline.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self).context("serialize manifest")?;
        json.push('\n');
        fs::write(path, json).with_context(|| format!("write manifest '{}'", path.display()))?;
        info!(
            path = %path.display(),
            generated = self.generated.len(),
            static_paths = self.static_paths.len(),
            "manifest written"
        );
        Ok(())
    }

    pub fn is_generated(&self, rel: &str) -> bool {
        self.generated.contains(rel)
    }

    pub fn has_static_files(&self) -> bool {
        !self.static_paths.is_empty()
    }

    /// Paths that are in both sets (should always be empty).
    pub fn overlap(&self) -> BTreeSet<&str> {
        self.generated
            .intersection(&self.static_paths)
            .map(String::as_str)
            .collect()
    }
}
