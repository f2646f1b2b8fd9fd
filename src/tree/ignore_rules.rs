//! `.gitignore` evaluation for a destination tree.
//!
//! Rules come from the `.gitignore` at the tree root, any nested `.gitignore`
//! files below it, and optionally those of its ancestors up to a boundary
//! directory (the repository checkout). Deeper files take precedence; within a
//! file the usual last-match-wins and `!negation` semantics apply.

use anyhow::{Context, Result};
use ignore::Match;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const IGNORE_FILE: &str = ".gitignore";

#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    /// Shallowest first.
    layers: Vec<Gitignore>,
}

impl IgnoreRules {
    /// No rules at all; nothing is ignored.
    pub fn empty(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            layers: Vec::new(),
        }
    }

    /// Load every `.gitignore` at or below `root`. A missing root yields no rules.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_with_ancestors(root, None)
    }

    /// Load rules for `root`, also consulting ancestor directories up to and
    /// including `boundary` when it is an ancestor of `root`.
    ///
    /// Both are made absolute first: the builder drops a leading `./` from its
    /// root, so relative layer paths would never prefix the queried paths.
    pub fn load_with_ancestors(root: &Path, boundary: Option<&Path>) -> Result<Self> {
        let root = absolute(root)?;
        let boundary = boundary.map(absolute).transpose()?;
        let root = root.as_path();
        let mut dirs: Vec<PathBuf> = Vec::new();

        if let Some(boundary) = boundary.as_deref()
            && root.starts_with(boundary)
            && root != boundary
        {
            let mut anc = root.parent();
            while let Some(dir) = anc {
                dirs.push(dir.to_path_buf());
                if dir == boundary {
                    break;
                }
                anc = dir.parent();
            }
        }

        if root.is_dir() {
            for entry in WalkDir::new(root)
                .follow_links(false)
                .into_iter()
                .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == ".git"))
            {
                let entry = entry?;
                if entry.file_type().is_dir() {
                    dirs.push(entry.into_path());
                }
            }
        }

        dirs.sort_by_key(|d| d.components().count());

        let mut layers = Vec::new();
        for dir in dirs {
            let file = dir.join(IGNORE_FILE);
            if !file.is_file() {
                continue;
            }
            let mut builder = GitignoreBuilder::new(&dir);
            // add() reports partial failures (bad globs) but keeps the good lines
            if let Some(e) = builder.add(&file) {
                warn!(path = %file.display(), error = %e, "problem reading ignore file");
            }
            match builder.build() {
                Ok(gi) => {
                    debug!(path = %file.display(), rules = gi.num_ignores() + gi.num_whitelists(), "loaded ignore file");
                    layers.push(gi);
                }
                Err(e) => warn!(path = %file.display(), error = %e, "ignore file unusable; skipping"),
            }
        }

        Ok(Self {
            root: root.to_path_buf(),
            layers,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True if `rel` (root-relative, `/`-separated) is ignored, either directly
    /// or because one of its parent directories is.
    pub fn is_ignored(&self, rel: &str, is_dir: bool) -> bool {
        let abs = self.root.join(rel);
        for layer in self.layers.iter().rev() {
            if !abs.starts_with(layer.path()) {
                continue;
            }
            match layer.matched_path_or_any_parents(&abs, is_dir) {
                Match::Ignore(_) => return true,
                Match::Whitelist(_) => return false,
                Match::None => {}
            }
        }
        false
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).with_context(|| format!("resolve '{}'", path.display()))
}

/// One-shot convenience: load the rules under `root` and test `rel`.
pub fn is_ignored(root: &Path, rel: &str) -> Result<bool> {
    let rules = IgnoreRules::load(root)?;
    let is_dir = root.join(rel).is_dir();
    Ok(rules.is_ignored(rel, is_dir))
}
