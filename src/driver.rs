//! Unit discovery and per-unit orchestration.
//!
//! A unit is one gem: `<staging_root>/<name>` is reconciled into
//! `<repo_dir>/<name>`. `entrypoint` handles exactly one unit and treats an
//! ambiguous or empty staging root as a configuration error;
//! `multi_entrypoint` handles every staged unit in parallel.

use anyhow::Result;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::OwlBotError;
use crate::hook::{CommandRunner, DefaultHook, Hook, HookContext, ScriptHook, SystemCommandRunner};
use crate::manifest::Manifest;
use crate::reconcile::helpers::io_error_with_help;
use crate::shutdown;
use crate::utils::dir_is_empty;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: String,
    pub staging_dir: PathBuf,
    pub gem_dir: PathBuf,
}

impl Unit {
    pub fn new(config: &Config, name: &str) -> Self {
        Self {
            name: name.to_string(),
            staging_dir: config.staging_root_path().join(name),
            gem_dir: config.gem_dir(name),
        }
    }
}

#[derive(Debug)]
pub enum UnitOutcome {
    Reconciled(Manifest),
    /// Not started because a shutdown was requested.
    Skipped,
    Failed(anyhow::Error),
}

#[derive(Debug)]
pub struct UnitReport {
    pub name: String,
    pub outcome: UnitOutcome,
}

impl UnitReport {
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Failed(_))
    }
}

/// Names of the staged unit directories, sorted. Hidden entries are ignored.
pub fn staged_unit_names(staging_root: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(staging_root).map_err(io_error_with_help("list staging root", staging_root))? {
        let entry = entry.map_err(io_error_with_help("list staging root", staging_root))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// Pick the single unit to process.
pub fn locate_unit(config: &Config, gem: Option<&str>) -> Result<Unit> {
    let root = config.staging_root_path();
    if !root.is_dir() {
        return Err(OwlBotError::NoStagingRoot(root).into());
    }
    let name = match gem {
        Some(name) => {
            let staging = root.join(name);
            if !staging.is_dir() {
                return Err(OwlBotError::StagingMissing(staging).into());
            }
            name.to_string()
        }
        None => {
            let mut names = staged_unit_names(&root)?;
            match names.len() {
                0 => return Err(OwlBotError::NoStagingDirs(root).into()),
                1 => names.remove(0),
                _ => return Err(OwlBotError::MultipleStagingDirs { root, names }.into()),
            }
        }
    };
    Ok(Unit::new(config, &name))
}

/// Reconcile one unit: load its manifest, run its hook, then clear its staging dir.
pub fn reconcile_one(config: &Config, unit: &Unit, runner: &dyn CommandRunner) -> Result<Manifest> {
    info!(unit = %unit.name, gem_dir = %unit.gem_dir.display(), "reconciling unit");
    let manifest_path = unit.gem_dir.join(&config.manifest_name);
    let previous = Manifest::load(&manifest_path)?;
    let mut ctx = HookContext::new(config, unit, previous, runner)?;

    let script_path = unit.gem_dir.join(&config.script_name);
    if script_path.is_file() {
        ScriptHook::load(&script_path)?.run(&mut ctx)?;
    } else {
        debug!(unit = %unit.name, "no extension script; using default hook");
        DefaultHook.run(&mut ctx)?;
    }

    let manifest = Manifest::load(&manifest_path)?;
    cleanup_staging(&config.staging_root_path(), &unit.staging_dir)?;
    info!(
        unit = %unit.name,
        generated = manifest.generated.len(),
        static_paths = manifest.static_paths.len(),
        "unit reconciled"
    );
    Ok(manifest)
}

/// Reconcile every staged unit; units run in parallel and fail independently.
pub fn reconcile_many(config: &Config, runner: &dyn CommandRunner) -> Result<Vec<UnitReport>> {
    let root = config.staging_root_path();
    let names = staged_unit_names(&root)?;
    info!(staging_root = %root.display(), units = names.len(), "reconciling staged units");

    let reports = names
        .into_par_iter()
        .map(|name| {
            if shutdown::is_requested() {
                warn!(unit = %name, "shutdown requested; unit skipped");
                return UnitReport {
                    name,
                    outcome: UnitOutcome::Skipped,
                };
            }
            let unit = Unit::new(config, &name);
            let outcome = match reconcile_one(config, &unit, runner) {
                Ok(manifest) => UnitOutcome::Reconciled(manifest),
                Err(e) => {
                    let code = e.downcast_ref::<OwlBotError>().map(OwlBotError::code);
                    error!(unit = %name, code = ?code, error = %format!("{e:#}"), "unit failed");
                    UnitOutcome::Failed(e)
                }
            };
            UnitReport { name, outcome }
        })
        .collect();
    Ok(reports)
}

/// Single-unit entrypoint with the system command runner.
pub fn entrypoint(config: &Config, gem: Option<&str>) -> Result<Manifest> {
    let unit = locate_unit(config, gem)?;
    reconcile_one(config, &unit, &SystemCommandRunner)
}

/// All-units entrypoint. A missing staging root means there is nothing to do.
pub fn multi_entrypoint(config: &Config) -> Result<Vec<UnitReport>> {
    let root = config.staging_root_path();
    if !root.is_dir() {
        info!(staging_root = %root.display(), "no staging root; nothing to do");
        return Ok(Vec::new());
    }
    reconcile_many(config, &SystemCommandRunner)
}

fn cleanup_staging(staging_root: &Path, staging_dir: &Path) -> Result<()> {
    match fs::remove_dir_all(staging_dir) {
        Ok(()) => debug!(path = %staging_dir.display(), "removed staging dir"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_error_with_help("remove staging dir", staging_dir)(e)),
    }
    // Another unit may be emptying the root concurrently; losing that race is fine.
    if dir_is_empty(staging_root).unwrap_or(false) {
        match fs::remove_dir(staging_root) {
            Ok(()) => debug!(path = %staging_root.display(), "removed empty staging root"),
            Err(e) => debug!(path = %staging_root.display(), error = %e, "staging root kept"),
        }
    }
    Ok(())
}
