//! Data-driven extension scripts (`.owlbot.xml`).
//!
//! The document is an ordered list of steps, each mapping onto one
//! [`HookContext`] capability:
//!
//! ```xml
//! <owlbot>
//!   <prevent_overwrite path="lib/my_gem/handwritten.rb"/>
//!   <modifier path="lib/**/*.rb">
//!     <replace pattern="Copyright \d{4}" with="Copyright 2021" all="true"/>
//!     <delete_block header="def deprecated_helper"/>
//!   </modifier>
//!   <prepare_multi_wrapper><gem>my-gem</gem><gem>my-gem-extra</gem></prepare_multi_wrapper>
//!   <move_files/>
//!   <write path="EXTRA.md" newline="true">extra</write>
//!   <remove path="obsolete.txt"/>
//!   <run dir="."><arg>bundle</arg><arg>exec</arg><arg>rake</arg></run>
//!   <update_manifest/>
//! </owlbot>
//! ```
//!
//! The script can only reach the unit's gem directory; paths that escape it
//! are rejected.

use anyhow::{Context, Result};
use quick_xml::de::from_str as from_xml_str;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{Hook, HookContext};
use crate::block_selector::select_block;
use crate::errors::OwlBotError;

#[derive(Debug, Deserialize)]
#[serde(rename = "owlbot")]
struct ScriptDoc {
    #[serde(rename = "$value", default)]
    steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Step {
    PreventOverwrite {
        #[serde(rename = "@path")]
        path: String,
    },
    Modifier {
        #[serde(rename = "@path")]
        path: String,
        #[serde(rename = "$value", default)]
        transforms: Vec<TransformStep>,
    },
    PrepareMultiWrapper {
        #[serde(rename = "gem", default)]
        gems: Vec<String>,
    },
    MoveFiles,
    UpdateManifest,
    Run {
        #[serde(rename = "@dir", default)]
        dir: Option<String>,
        #[serde(rename = "arg", default)]
        args: Vec<String>,
    },
    Write {
        #[serde(rename = "@path")]
        path: String,
        /// Element text is trimmed on read; this puts the final line break back.
        #[serde(rename = "@newline", default)]
        newline: bool,
        #[serde(rename = "$text", default)]
        content: String,
    },
    Remove {
        #[serde(rename = "@path")]
        path: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TransformStep {
    Replace {
        #[serde(rename = "@pattern")]
        pattern: String,
        #[serde(rename = "@with", default)]
        with: String,
        #[serde(rename = "@all", default)]
        all: bool,
    },
    DeleteBlock {
        #[serde(rename = "@header")]
        header: String,
    },
}

/// Compiled form of a transform; regexes are built once at load time.
#[derive(Debug, Clone)]
enum Transform {
    Replace { regex: Regex, with: String, all: bool },
    DeleteBlock { header: String },
}

impl Transform {
    fn apply(&self, content: String) -> String {
        match self {
            Transform::Replace { regex, with, all } => {
                let out = if *all {
                    regex.replace_all(&content, with.as_str())
                } else {
                    regex.replace(&content, with.as_str())
                };
                out.into_owned()
            }
            Transform::DeleteBlock { header } => select_block(&content, header).delete(),
        }
    }
}

/// A step ready to run against a context.
#[derive(Debug, Clone)]
enum Action {
    PreventOverwrite(String),
    Modifier { path: String, transforms: Vec<Transform> },
    PrepareMultiWrapper(Vec<String>),
    MoveFiles,
    UpdateManifest,
    Run { dir: Option<String>, args: Vec<String> },
    Write { path: String, content: String },
    Remove(String),
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::PreventOverwrite(_) => "prevent_overwrite",
            Action::Modifier { .. } => "modifier",
            Action::PrepareMultiWrapper(_) => "prepare_multi_wrapper",
            Action::MoveFiles => "move_files",
            Action::UpdateManifest => "update_manifest",
            Action::Run { .. } => "run",
            Action::Write { .. } => "write",
            Action::Remove(_) => "remove",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScriptHook {
    path: PathBuf,
    steps: Vec<Action>,
}

impl ScriptHook {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| script_error(path, format!("unreadable: {e}")))?;
        Self::parse(path, &text)
    }

    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let doc: ScriptDoc = from_xml_str(text).map_err(|e| script_error(path, e.to_string()))?;
        let mut steps = Vec::with_capacity(doc.steps.len());
        for step in doc.steps {
            steps.push(compile(path, step)?);
        }
        debug!(script = %path.display(), steps = steps.len(), "extension script loaded");
        Ok(Self {
            path: path.to_path_buf(),
            steps,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn script_error(path: &Path, message: String) -> anyhow::Error {
    OwlBotError::Script {
        path: path.to_path_buf(),
        message,
    }
    .into()
}

fn compile(script: &Path, step: Step) -> Result<Action> {
    Ok(match step {
        Step::PreventOverwrite { path } => Action::PreventOverwrite(path),
        Step::Modifier { path: target, transforms } => {
            let mut compiled = Vec::with_capacity(transforms.len());
            for t in transforms {
                compiled.push(match t {
                    TransformStep::Replace { pattern, with, all } => Transform::Replace {
                        regex: Regex::new(&pattern).map_err(|e| {
                            script_error(script, format!("bad replace pattern '{pattern}': {e}"))
                        })?,
                        with,
                        all,
                    },
                    TransformStep::DeleteBlock { header } => Transform::DeleteBlock { header },
                });
            }
            Action::Modifier {
                path: target,
                transforms: compiled,
            }
        }
        Step::PrepareMultiWrapper { gems } => Action::PrepareMultiWrapper(gems),
        Step::MoveFiles => Action::MoveFiles,
        Step::UpdateManifest => Action::UpdateManifest,
        Step::Run { dir, args } => Action::Run { dir, args },
        Step::Write {
            path,
            newline,
            mut content,
        } => {
            if newline {
                content.push('\n');
            }
            Action::Write { path, content }
        }
        Step::Remove { path } => Action::Remove(path),
    })
}

impl Hook for ScriptHook {
    fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        info!(unit = %ctx.unit_name(), script = %self.path.display(), "running extension script");
        for (idx, action) in self.steps.iter().enumerate() {
            debug!(unit = %ctx.unit_name(), step = idx, kind = action.name(), "script step");
            run_action(ctx, action).with_context(|| {
                format!("{} step {} ({})", self.path.display(), idx + 1, action.name())
            })?;
        }
        Ok(())
    }
}

fn run_action(ctx: &mut HookContext<'_>, action: &Action) -> Result<()> {
    match action {
        Action::PreventOverwrite(path) => ctx.prevent_overwrite_of_existing(path),
        Action::Modifier { path, transforms } => {
            let transforms = transforms.clone();
            ctx.modifier(path, move |content| {
                Ok(transforms.iter().fold(content, |acc, t| t.apply(acc)))
            })
        }
        Action::PrepareMultiWrapper(gems) => ctx.prepare_multi_wrapper(gems.as_slice()),
        Action::MoveFiles => ctx.move_files().map(|_| ()),
        Action::UpdateManifest => ctx.update_manifest().map(|_| ()),
        Action::Run { dir, args } => {
            let out = ctx.run_command(args, dir.as_deref())?;
            debug!(unit = %ctx.unit_name(), stdout = %out.stdout.trim_end(), "command output");
            Ok(())
        }
        Action::Write { path, content } => ctx.write_file(path, content),
        Action::Remove(path) => ctx.remove_path(path),
    }
}
