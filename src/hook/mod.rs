//! Hook runtime.
//!
//! A hook drives one unit's reconciliation through a [`HookContext`]: it may
//! protect paths, register modifiers, prepare a multi-wrapper, run commands,
//! and decides when (or whether) `move_files` and `update_manifest` run.
//! Compiled hooks implement [`Hook`]; per-repository `.owlbot.xml` files are
//! loaded as a [`ScriptHook`].

pub mod command;
pub mod context;
pub mod registry;
pub mod script;

use anyhow::Result;

pub use command::{CommandOutput, CommandRunner, SystemCommandRunner};
pub use context::HookContext;
pub use registry::{ModifierRegistry, PathMatcher, ProtectionSet};
pub use script::ScriptHook;

pub trait Hook {
    fn run(&self, ctx: &mut HookContext<'_>) -> Result<()>;
}

impl<F> Hook for F
where
    F: Fn(&mut HookContext<'_>) -> Result<()>,
{
    fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        self(ctx)
    }
}

/// Used when a unit has no extension script.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHook;

impl Hook for DefaultHook {
    fn run(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        ctx.move_files()?;
        ctx.update_manifest()?;
        Ok(())
    }
}
