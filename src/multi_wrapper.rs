//! Multi-wrapper preparation: fold several staged gems into the first one.
//!
//! The unit's staging directory holds one subdirectory per listed gem. The
//! first gem is the primary. Each secondary contributes files the primary
//! lacks, its gemspec `add_dependency` lines, and its Gemfile
//! `local_dependencies` entries. A secondary's `VERSION` constant is blanked,
//! since only the primary's version is published. Afterwards the primary's
//! tree replaces the staging directory.

use anyhow::{Result, bail};
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

use crate::reconcile::helpers::io_error_with_help;
use crate::tree::{self, EntryKind};

static ADD_DEPENDENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*\w+\.add(?:_runtime)?_dependency\s+["']([^"']+)["']"#).expect("static regex")
});

static LOCAL_DEPENDENCIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([ \t]*local_dependencies\s*=\s*)\[([^\]]*)\]").expect("static regex")
});

static VERSION_ASSIGNMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^([ \t]*)VERSION\s*=\s*["'][^"']*["']"#).expect("static regex"));

static QUOTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["']([^"']+)["']"#).expect("static regex"));

fn gemspec_name(gem: &str) -> String {
    format!("{gem}.gemspec")
}

/// `lib/google/cloud/foo/version.rb` for `google-cloud-foo`.
pub fn version_file(gem: &str) -> String {
    format!("lib/{}/version.rb", gem.replace('-', "/"))
}

pub fn prepare(staging_dir: &Path, gems: &[String]) -> Result<()> {
    let Some((primary, secondaries)) = gems.split_first() else {
        bail!("prepare_multi_wrapper needs at least one gem name");
    };
    let primary_dir = staging_dir.join(primary);
    if !primary_dir.is_dir() {
        bail!("primary gem '{}' has no staging dir at {}", primary, primary_dir.display());
    }

    for gem in secondaries {
        let secondary_dir = staging_dir.join(gem);
        if !secondary_dir.is_dir() {
            bail!("gem '{}' has no staging dir at {}", gem, secondary_dir.display());
        }
        fold_secondary(&primary_dir, primary, &secondary_dir, gem)?;
    }

    promote(staging_dir, &primary_dir)?;
    info!(primary = %primary, merged = secondaries.len(), "multi-wrapper prepared");
    Ok(())
}

fn fold_secondary(primary_dir: &Path, primary: &str, secondary_dir: &Path, gem: &str) -> Result<()> {
    let own_gemspec = gemspec_name(gem);
    let version_rel = version_file(gem);

    for entry in tree::list(secondary_dir) {
        let entry = entry?;
        if entry.rel == own_gemspec {
            continue;
        }
        let dest = primary_dir.join(&entry.rel);
        if entry.rel == "Gemfile" && dest.is_file() {
            merge_gemfile(&dest, &entry.path)?;
            continue;
        }
        if fs::symlink_metadata(&dest).is_ok() {
            debug!(gem = %gem, path = %entry.rel, "primary already has this file");
            continue;
        }
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(io_error_with_help("create directory", parent))?;
        }
        match entry.kind {
            EntryKind::File => {
                let mut content =
                    fs::read(&entry.path).map_err(io_error_with_help("read staged file", &entry.path))?;
                if entry.rel == version_rel {
                    content = blank_version(&String::from_utf8_lossy(&content)).into_bytes();
                }
                fs::write(&dest, content).map_err(io_error_with_help("write file", &dest))?;
            }
            EntryKind::Symlink => copy_symlink(&entry.path, &dest)?,
        }
        debug!(gem = %gem, path = %entry.rel, "copied into primary");
    }

    let secondary_spec = secondary_dir.join(&own_gemspec);
    if secondary_spec.is_file() {
        let primary_spec = primary_dir.join(gemspec_name(primary));
        if primary_spec.is_file() {
            let ours = read_text(&primary_spec)?;
            let theirs = read_text(&secondary_spec)?;
            write_text(&primary_spec, &merge_dependencies(&ours, &theirs))?;
        } else {
            fs::copy(&secondary_spec, &primary_spec)
                .map_err(io_error_with_help("copy gemspec", &primary_spec))?;
        }
    }
    Ok(())
}

fn merge_gemfile(primary: &Path, secondary: &Path) -> Result<()> {
    let ours = read_text(primary)?;
    let theirs = read_text(secondary)?;
    let merged = merge_local_dependencies(&ours, &theirs);
    if merged != ours {
        write_text(primary, &merged)?;
    }
    Ok(())
}

/// Add the secondary's `add_dependency` lines the primary does not declare,
/// right after the primary's last one.
pub fn merge_dependencies(primary: &str, secondary: &str) -> String {
    let declared: Vec<&str> = primary
        .lines()
        .filter_map(|l| ADD_DEPENDENCY.captures(l).and_then(|c| c.get(1)).map(|m| m.as_str()))
        .collect();
    let additions: Vec<&str> = secondary
        .split_inclusive('\n')
        .filter(|l| {
            ADD_DEPENDENCY
                .captures(l)
                .and_then(|c| c.get(1))
                .is_some_and(|m| !declared.contains(&m.as_str()))
        })
        .collect();
    if additions.is_empty() {
        return primary.to_string();
    }

    let lines: Vec<&str> = primary.split_inclusive('\n').collect();
    let anchor = lines
        .iter()
        .rposition(|l| ADD_DEPENDENCY.is_match(l))
        .map(|i| i + 1)
        .or_else(|| lines.iter().rposition(|l| l.trim() == "end"))
        .unwrap_or(lines.len());

    let mut out = String::with_capacity(primary.len() + additions.iter().map(|a| a.len()).sum::<usize>());
    for l in &lines[..anchor] {
        out.push_str(l);
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for a in &additions {
        out.push_str(a);
        if !a.ends_with('\n') {
            out.push('\n');
        }
    }
    for l in &lines[anchor..] {
        out.push_str(l);
    }
    out
}

fn quoted_items(list: &str) -> Vec<String> {
    QUOTED.captures_iter(list).map(|c| c[1].to_string()).collect()
}

/// Union of both `local_dependencies = [...]` literals, primary entries first.
pub fn merge_local_dependencies(primary: &str, secondary: &str) -> String {
    let Some(theirs) = LOCAL_DEPENDENCIES.captures(secondary) else {
        return primary.to_string();
    };
    let extra = quoted_items(&theirs[2]);
    LOCAL_DEPENDENCIES
        .replace(primary, |caps: &Captures| {
            let mut items = quoted_items(&caps[2]);
            for item in &extra {
                if !items.contains(item) {
                    items.push(item.clone());
                }
            }
            let rendered: Vec<String> = items.iter().map(|i| format!("\"{i}\"")).collect();
            format!("{}[{}]", &caps[1], rendered.join(", "))
        })
        .into_owned()
}

/// `VERSION = "1.2.3"` becomes an unused, empty constant.
pub fn blank_version(content: &str) -> String {
    VERSION_ASSIGNMENT
        .replace_all(content, "${1}# @private Unused\n${1}VERSION = \"\"")
        .into_owned()
}

/// Replace the staging dir's contents with the primary gem's tree.
fn promote(staging_dir: &Path, primary_dir: &Path) -> Result<()> {
    let Some(name) = staging_dir.file_name() else {
        bail!("staging dir has no name: {}", staging_dir.display());
    };
    let holding = staging_dir.with_file_name(format!(".{}.multi-wrapper", name.to_string_lossy()));
    if fs::symlink_metadata(&holding).is_ok() {
        fs::remove_dir_all(&holding).map_err(io_error_with_help("remove leftover directory", &holding))?;
    }
    fs::rename(primary_dir, &holding).map_err(io_error_with_help("move primary tree", primary_dir))?;
    fs::remove_dir_all(staging_dir).map_err(io_error_with_help("remove staging dir", staging_dir))?;
    fs::rename(&holding, staging_dir).map_err(io_error_with_help("restore staging dir", staging_dir))?;
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(io_error_with_help("read file", path))
}

fn write_text(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(io_error_with_help("write file", path))
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> Result<()> {
    let target = fs::read_link(src).map_err(io_error_with_help("read symlink", src))?;
    std::os::unix::fs::symlink(target, dest).map_err(io_error_with_help("create symlink", dest))
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, _dest: &Path) -> Result<()> {
    bail!("symlinks are not supported on this platform: {}", src.display())
}
