//! External command execution for hooks.

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// Exit status and captured output of one command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `-1` when the process was killed by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Runs one command synchronously. No retries.
pub trait CommandRunner: Send + Sync {
    fn run(&self, argv: &[String], cwd: &Path) -> Result<CommandOutput>;
}

/// Spawns real processes with `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandRunner;

impl CommandRunner for SystemCommandRunner {
    fn run(&self, argv: &[String], cwd: &Path) -> Result<CommandOutput> {
        let Some((program, args)) = argv.split_first() else {
            bail!("no command specified");
        };
        info!(program = %program, cwd = %cwd.display(), "running command");
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .output()
            .with_context(|| format!("Failed to spawn '{program}' in {}", cwd.display()))?;
        let result = CommandOutput {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(program = %program, status = result.status, "command finished");
        Ok(result)
    }
}
