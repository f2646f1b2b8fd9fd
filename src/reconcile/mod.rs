//! Reconciliation engine.
//!
//! `move_files` lands every staged entry in the gem directory (preservation
//! rules first, then registered modifiers), removes previously generated
//! paths the staging tree no longer produces, and rewrites the manifest.
//! Nothing is rolled back on failure; re-running after fixing the cause
//! converges to the same result.

mod entry;
pub(crate) mod helpers;
mod meta;
mod prune;

use anyhow::Result;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::errors::OwlBotError;
use crate::hook::{ModifierRegistry, ProtectionSet};
use crate::manifest::Manifest;
use crate::rules::RuleContext;
use crate::tree::{self, IgnoreRules};

use entry::Existing;
use helpers::io_error_with_help;

/// Inputs for one `move_files` pass. Borrowed from the hook context.
pub struct Reconciler<'a> {
    pub staging_dir: &'a Path,
    pub gem_dir: &'a Path,
    pub manifest_name: &'a str,
    /// Outermost directory whose `.gitignore` files apply to the gem directory.
    pub ignore_boundary: Option<&'a Path>,
    pub previous: &'a Manifest,
    pub protection: &'a ProtectionSet,
    pub modifiers: &'a ModifierRegistry,
    pub rules: RuleContext<'a>,
}

#[derive(Debug, Clone, Default)]
pub struct MoveOutcome {
    pub manifest: Manifest,
    /// Staged paths skipped because they were protected and already present.
    /// Those the previous manifest listed as generated stay in `manifest.generated`.
    pub protected: Vec<String>,
    pub deleted: Vec<String>,
}

impl Reconciler<'_> {
    pub fn move_files(&self) -> Result<MoveOutcome> {
        if !self.staging_dir.is_dir() {
            return Err(OwlBotError::StagingMissing(self.staging_dir.to_path_buf()).into());
        }
        fs::create_dir_all(self.gem_dir).map_err(io_error_with_help("create gem directory", self.gem_dir))?;

        let mut generated = BTreeSet::new();
        let mut protected = Vec::new();
        for entry in tree::list(self.staging_dir) {
            let entry = entry?;
            if entry.rel == self.manifest_name {
                debug!(path = %entry.rel, "staged manifest ignored");
                continue;
            }
            if self.land(&entry)? {
                generated.insert(entry.rel);
            } else {
                // Landed by an earlier run: still ours, though the content is left alone.
                if self.previous.is_generated(&entry.rel) {
                    generated.insert(entry.rel.clone());
                }
                protected.push(entry.rel);
            }
        }

        let deleted = self.delete_stale(&generated)?;
        let manifest = build_manifest(self.gem_dir, self.manifest_name, self.ignore_boundary, generated)?;
        manifest.save(&self.gem_dir.join(self.manifest_name))?;
        info!(
            gem_dir = %self.gem_dir.display(),
            generated = manifest.generated.len(),
            static_paths = manifest.static_paths.len(),
            protected = protected.len(),
            deleted = deleted.len(),
            "files moved"
        );
        Ok(MoveOutcome {
            manifest,
            protected,
            deleted,
        })
    }
}

/// Partition the gem directory: `generated` as given, `static` is everything
/// else on disk that is neither ignored nor the manifest itself.
pub fn build_manifest(
    gem_dir: &Path,
    manifest_name: &str,
    ignore_boundary: Option<&Path>,
    generated: BTreeSet<String>,
) -> Result<Manifest> {
    let ignore = IgnoreRules::load_with_ancestors(gem_dir, ignore_boundary)?;
    let static_paths = tree::list_or_empty(gem_dir)?
        .into_iter()
        .map(|e| e.rel)
        .filter(|rel| rel != manifest_name && !generated.contains(rel) && !ignore.is_ignored(rel, false))
        .collect();
    Ok(Manifest::new(generated, static_paths))
}

/// Recompute `static` after out-of-band writes, dropping generated entries
/// that no longer exist, and persist the result.
pub fn update_manifest(
    gem_dir: &Path,
    manifest_name: &str,
    ignore_boundary: Option<&Path>,
    generated: BTreeSet<String>,
) -> Result<Manifest> {
    fs::create_dir_all(gem_dir).map_err(io_error_with_help("create gem directory", gem_dir))?;
    let mut kept = BTreeSet::new();
    for rel in generated {
        if Existing::stat(&gem_dir.join(&rel))? == Existing::Absent {
            debug!(path = %rel, "generated path no longer exists; dropped");
        } else {
            kept.insert(rel);
        }
    }
    let manifest = build_manifest(gem_dir, manifest_name, ignore_boundary, kept)?;
    manifest.save(&gem_dir.join(manifest_name))?;
    Ok(manifest)
}
