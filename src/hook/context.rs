//! Per-invocation state handed to a hook.
//!
//! Owns the Protection Set, the Modifier Registry and the generated set
//! produced by `move_files`. Created fresh for each unit and dropped after
//! its hook returns; nothing here is shared across units.

use anyhow::Result;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::command::{CommandOutput, CommandRunner};
use super::registry::{ModifierRegistry, ProtectionSet, Transform};
use crate::block_selector::SourceText;
use crate::config::Config;
use crate::driver::Unit;
use crate::errors::OwlBotError;
use crate::manifest::Manifest;
use crate::multi_wrapper;
use crate::reconcile::helpers::io_error_with_help;
use crate::reconcile::{self, MoveOutcome, Reconciler};
use crate::rules::RuleContext;
use crate::utils::{join_within, remove_empty_dirs_upward};

pub struct HookContext<'a> {
    config: &'a Config,
    unit: &'a Unit,
    previous: Manifest,
    protection: ProtectionSet,
    modifiers: ModifierRegistry,
    generated: Option<BTreeSet<String>>,
    runner: &'a dyn CommandRunner,
}

impl<'a> HookContext<'a> {
    /// Fresh context for `unit`; the configured preserved paths are protected from the start.
    pub fn new(
        config: &'a Config,
        unit: &'a Unit,
        previous: Manifest,
        runner: &'a dyn CommandRunner,
    ) -> Result<Self> {
        Ok(Self {
            config,
            unit,
            previous,
            protection: ProtectionSet::from_patterns(config.preserved_paths.as_slice())?,
            modifiers: ModifierRegistry::new(),
            generated: None,
            runner,
        })
    }

    pub fn unit_name(&self) -> &str {
        &self.unit.name
    }

    pub fn gem_dir(&self) -> &Path {
        &self.unit.gem_dir
    }

    pub fn staging_dir(&self) -> &Path {
        &self.unit.staging_dir
    }

    /// Manifest as loaded before this invocation.
    pub fn previous_manifest(&self) -> &Manifest {
        &self.previous
    }

    pub fn protection(&self) -> &ProtectionSet {
        &self.protection
    }

    /// Paths generated by the last `move_files`, if it ran.
    pub fn generated(&self) -> Option<&BTreeSet<String>> {
        self.generated.as_ref()
    }

    pub fn prevent_overwrite_of_existing(&mut self, path: &str) -> Result<()> {
        self.protection.add(path)?;
        debug!(unit = %self.unit.name, path, "protection registered");
        Ok(())
    }

    pub fn modifier<F>(&mut self, path: &str, transform: F) -> Result<()>
    where
        F: Fn(String) -> Result<String> + 'static,
    {
        self.register_transform(path, Box::new(transform))
    }

    pub fn register_transform(&mut self, path: &str, transform: Transform) -> Result<()> {
        self.modifiers.register(path, transform)?;
        debug!(unit = %self.unit.name, path, "modifier registered");
        Ok(())
    }

    /// Block-selector entry point for transforms.
    pub fn source_text<'s>(&self, content: &'s str) -> SourceText<'s> {
        SourceText::new(content)
    }

    pub fn prepare_multi_wrapper<S: AsRef<str>>(&mut self, gems: &[S]) -> Result<()> {
        let gems: Vec<String> = gems.iter().map(|g| g.as_ref().to_string()).collect();
        if !self.unit.staging_dir.is_dir() {
            return Err(OwlBotError::StagingMissing(self.unit.staging_dir.clone()).into());
        }
        multi_wrapper::prepare(&self.unit.staging_dir, &gems)
    }

    pub fn move_files(&mut self) -> Result<MoveOutcome> {
        let reconciler = Reconciler {
            staging_dir: &self.unit.staging_dir,
            gem_dir: &self.unit.gem_dir,
            manifest_name: &self.config.manifest_name,
            ignore_boundary: Some(self.config.repo_dir.as_path()),
            previous: &self.previous,
            protection: &self.protection,
            modifiers: &self.modifiers,
            rules: RuleContext {
                unit_name: &self.unit.name,
                has_static_files: self.previous.has_static_files(),
                policy: &self.config.library_type,
            },
        };
        let outcome = reconciler.move_files()?;
        self.generated = Some(outcome.manifest.generated.clone());
        Ok(outcome)
    }

    pub fn update_manifest(&mut self) -> Result<Manifest> {
        let generated = self.generated.clone().unwrap_or_default();
        let manifest = reconcile::update_manifest(
            &self.unit.gem_dir,
            &self.config.manifest_name,
            Some(self.config.repo_dir.as_path()),
            generated,
        )?;
        self.generated = Some(manifest.generated.clone());
        info!(
            unit = %self.unit.name,
            generated = manifest.generated.len(),
            static_paths = manifest.static_paths.len(),
            "manifest updated"
        );
        Ok(manifest)
    }

    /// Run `argv` in `dir` (relative to the gem dir; the gem dir itself when None).
    /// A non-zero exit is an error.
    pub fn run_command(&self, argv: &[String], dir: Option<&str>) -> Result<CommandOutput> {
        let cwd = self.resolve_dir(dir)?;
        let output = self.runner.run(argv, &cwd)?;
        if !output.success() {
            return Err(OwlBotError::CommandFailed {
                program: argv.first().cloned().unwrap_or_default(),
                status: output.status,
            }
            .into());
        }
        Ok(output)
    }

    /// Write a file inside the gem dir, creating parents.
    pub fn write_file(&self, rel: &str, content: &str) -> Result<()> {
        let path = join_within(&self.unit.gem_dir, rel)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error_with_help("create directory", parent))?;
        }
        fs::write(&path, content).map_err(io_error_with_help("write file", &path))?;
        debug!(unit = %self.unit.name, path = rel, "hook wrote file");
        Ok(())
    }

    /// Remove a file, symlink or directory inside the gem dir. Missing paths are fine.
    pub fn remove_path(&self, rel: &str) -> Result<()> {
        let path = join_within(&self.unit.gem_dir, rel)?;
        let meta = match fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(io_error_with_help("stat path", &path)(e)),
        };
        if meta.is_dir() {
            fs::remove_dir_all(&path).map_err(io_error_with_help("remove directory", &path))?;
        } else {
            fs::remove_file(&path).map_err(io_error_with_help("remove file", &path))?;
        }
        if let Some(parent) = path.parent() {
            remove_empty_dirs_upward(&self.unit.gem_dir, parent)
                .map_err(io_error_with_help("remove empty directory", parent))?;
        }
        debug!(unit = %self.unit.name, path = rel, "hook removed path");
        Ok(())
    }

    fn resolve_dir(&self, dir: Option<&str>) -> Result<PathBuf> {
        match dir.map(str::trim) {
            None | Some("") | Some(".") => Ok(self.unit.gem_dir.clone()),
            Some(rel) => Ok(join_within(&self.unit.gem_dir, rel)?),
        }
    }
}
