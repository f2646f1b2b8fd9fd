//! Config validation logic.

use anyhow::{Context, Result, bail};
use glob::Pattern;
use std::fs;
use tracing::{error, info};

use super::types::Config;

impl Config {
    /// Check that `repo_dir` is a readable directory and that every preserved
    /// path is a valid glob. The library_type pattern is compiled at load time.
    pub fn validate(&self) -> Result<()> {
        let repo = &self.repo_dir;
        if !repo.exists() {
            error!("repo_dir does not exist: {}", repo.display());
            bail!("repo_dir does not exist: {}", repo.display());
        }
        if !repo.is_dir() {
            error!("repo_dir is not a directory: {}", repo.display());
            bail!("repo_dir is not a directory: {}", repo.display());
        }
        fs::read_dir(repo).with_context(|| {
            format!("Cannot read repo_dir '{}'; check permissions", repo.display())
        })?;

        for pattern in &self.preserved_paths {
            Pattern::new(pattern)
                .with_context(|| format!("invalid preserved path pattern '{pattern}'"))?;
        }
        if self.manifest_name.is_empty() || self.manifest_name.contains('/') {
            bail!("manifest_name must be a plain file name: '{}'", self.manifest_name);
        }
        if self.script_name.is_empty() || self.script_name.contains('/') {
            bail!("script_name must be a plain file name: '{}'", self.script_name);
        }

        info!(
            repo_dir = %repo.display(),
            staging_root = %self.staging_root_path().display(),
            "config validated"
        );
        Ok(())
    }
}
