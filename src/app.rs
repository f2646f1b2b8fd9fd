//! Application orchestrator.
//! Loads config, applies CLI overrides, initializes logging, installs the
//! signal handler, and runs the single-gem or all-gems entrypoint.

use anyhow::{Result, bail};
use std::sync::{Arc, Mutex};
use tracing::{debug, error};

use owlbot_postprocessor::cli::Args;
use owlbot_postprocessor::config::CONFIG_ENV;
use owlbot_postprocessor::output as out;
use owlbot_postprocessor::{OwlBotError, default_config_path, entrypoint, load_config, multi_entrypoint, shutdown};

use crate::logging::init_tracing;

fn print_config_location() {
    if let Ok(p) = std::env::var(CONFIG_ENV) {
        out::print_info(&format!("Using {CONFIG_ENV} (explicit):\n  {p}\n"));
        return;
    }
    match default_config_path() {
        Some(p) => {
            out::print_info(&format!("Default config path:\n  {}\n", p.display()));
            if p.exists() {
                out::print_info("A config file exists at that location.");
            } else {
                out::print_info("No config file exists there; built-in defaults are used.");
            }
        }
        None => out::print_error("Could not determine a default config path."),
    }
}

/// Run the CLI application.
pub fn run(args: Args) -> Result<()> {
    if args.print_config {
        print_config_location();
        return Ok(());
    }

    let mut cfg = load_config()?;
    args.apply_overrides(&mut cfg);

    let guard_opt = init_tracing(&cfg.log_level, cfg.log_file.as_deref(), cfg.json).map_err(|e| {
        out::print_error(&format!("Failed to initialize logging: {e}"));
        e
    })?;

    // Dropping the guard flushes the file appender.
    let guard_slot = Arc::new(Mutex::new(guard_opt));
    {
        let guard_slot = Arc::clone(&guard_slot);
        ctrlc::set_handler(move || {
            shutdown::request();
            out::print_warn("Received interrupt; finishing the current gem(s) before stopping...");
            if let Ok(mut g) = guard_slot.lock() {
                let _ = g.take();
            }
        })?;
    }

    debug!(?args, "starting owlbot-postprocessor");

    let result = (|| -> Result<()> {
        cfg.validate()?;
        match args.gem.as_deref() {
            Some(gem) => {
                let manifest = entrypoint(&cfg, Some(gem)).inspect_err(|e| {
                    if let Some(ob) = e.downcast_ref::<OwlBotError>() {
                        error!(code = ob.code(), configuration = ob.is_configuration(), "{ob}");
                    } else {
                        error!(error = %format!("{e:#}"), "reconciliation failed");
                    }
                })?;
                out::print_unit(gem, &manifest);
                Ok(())
            }
            None => {
                let reports = multi_entrypoint(&cfg)?;
                if reports.is_empty() {
                    out::print_info("Nothing staged; nothing to do.");
                }
                let failed = out::print_reports(&reports);
                if failed > 0 {
                    bail!("{failed} of {} gem(s) failed", reports.len());
                }
                Ok(())
            }
        }
    })();

    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }

    result
}
