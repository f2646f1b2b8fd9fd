//! User-facing terminal messages. Colors only when stdout is a TTY.

use owo_colors::OwoColorize;

use crate::driver::{UnitOutcome, UnitReport};
use crate::manifest::Manifest;

fn is_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

pub fn print_info(msg: &str) {
    if is_tty() {
        println!("{} {}", "info:".cyan().bold(), msg);
    } else {
        println!("info: {msg}");
    }
}

pub fn print_warn(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "warn:".yellow().bold(), msg);
    } else {
        eprintln!("warn: {msg}");
    }
}

pub fn print_error(msg: &str) {
    if is_tty() {
        eprintln!("{} {}", "error:".red().bold(), msg);
    } else {
        eprintln!("error: {msg}");
    }
}

pub fn print_success(msg: &str) {
    if is_tty() {
        println!("{} {}", "ok:".green().bold(), msg);
    } else {
        println!("ok: {msg}");
    }
}

fn summary(name: &str, manifest: &Manifest) -> String {
    format!(
        "{name}: {} generated, {} static",
        manifest.generated.len(),
        manifest.static_paths.len()
    )
}

pub fn print_unit(name: &str, manifest: &Manifest) {
    print_success(&summary(name, manifest));
}

/// One line per unit. Returns the number of failed units.
pub fn print_reports(reports: &[UnitReport]) -> usize {
    let mut failed = 0;
    for report in reports {
        match &report.outcome {
            UnitOutcome::Reconciled(manifest) => print_unit(&report.name, manifest),
            UnitOutcome::Skipped => print_warn(&format!("{}: skipped (interrupted)", report.name)),
            UnitOutcome::Failed(e) => {
                failed += 1;
                print_error(&format!("{}: {e:#}", report.name));
            }
        }
    }
    failed
}
