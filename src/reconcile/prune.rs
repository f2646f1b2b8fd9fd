//! Stale generated paths: delete them and collapse the directories they leave empty.

use anyhow::Result;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use super::Reconciler;
use super::entry::Existing;
use super::helpers::io_error_with_help;
use crate::utils::{join_within, remove_empty_dirs_upward};

impl Reconciler<'_> {
    /// Remove every previously generated path the new run did not produce.
    /// Returns the paths actually deleted.
    pub(super) fn delete_stale(&self, generated: &BTreeSet<String>) -> Result<Vec<String>> {
        let mut deleted = Vec::new();
        for rel in self.previous.generated.difference(generated) {
            if self.protection.is_protected(rel) {
                debug!(path = %rel, "stale path is protected; kept");
                continue;
            }
            let prefix = format!("{rel}/");
            if generated.iter().any(|g| g.starts_with(&prefix)) {
                debug!(path = %rel, "stale path is now a generated directory; kept");
                continue;
            }
            let path = match join_within(self.gem_dir, rel) {
                Ok(p) => p,
                Err(e) => {
                    warn!(path = %rel, error = %e, "ignoring manifest entry");
                    continue;
                }
            };

            if self.through_symlink(&path)? {
                debug!(path = %rel, "stale path lies behind a symlink; kept");
                continue;
            }

            match Existing::stat(&path)? {
                Existing::Absent => continue,
                Existing::Dir => fs::remove_dir_all(&path)
                    .map_err(io_error_with_help("remove stale directory", &path))?,
                Existing::File | Existing::Symlink => {
                    fs::remove_file(&path).map_err(io_error_with_help("remove stale file", &path))?
                }
            }
            if let Some(parent) = path.parent() {
                remove_empty_dirs_upward(self.gem_dir, parent)
                    .map_err(io_error_with_help("remove empty directory", parent))?;
            }
            deleted.push(rel.clone());
        }
        if !deleted.is_empty() {
            info!(count = deleted.len(), "deleted stale generated paths");
        }
        Ok(deleted)
    }

    /// True if a directory between the gem dir and `path` is a symlink.
    fn through_symlink(&self, path: &Path) -> Result<bool> {
        let mut anc = path.parent();
        while let Some(dir) = anc {
            if dir == self.gem_dir || !dir.starts_with(self.gem_dir) {
                break;
            }
            if Existing::stat(dir)? == Existing::Symlink {
                return Ok(true);
            }
            anc = dir.parent();
        }
        Ok(false)
    }
}
