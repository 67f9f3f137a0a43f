//! Colored status lines for live operator feedback.
//!
//! Lines go to stdout unless `route_to_stderr(true)` was called, which the
//! CLI does in `--json` mode so stdout carries only the JSON document.
//! Diagnostics meant for debugging go through `tracing` instead.

use console::style;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};

static TO_STDERR: AtomicBool = AtomicBool::new(false);

pub fn route_to_stderr(on: bool) {
    TO_STDERR.store(on, Ordering::Relaxed);
}

/// Write one raw line to the status stream.
pub fn line(msg: impl Display) {
    if TO_STDERR.load(Ordering::Relaxed) {
        eprintln!("{msg}");
    } else {
        println!("{msg}");
    }
}

pub fn header(title: impl Display) {
    line("");
    line(style(format!("=== {title} ===")).bold().cyan());
}

pub fn info(msg: impl Display) {
    line(format!("{} {msg}", style("[INFO]").blue()));
}

pub fn success(msg: impl Display) {
    line(format!("{} {msg}", style("[ OK ]").green().bold()));
}

pub fn warn(msg: impl Display) {
    line(format!("{} {msg}", style("[WARN]").yellow().bold()));
}

pub fn error(msg: impl Display) {
    line(format!("{} {msg}", style("[FAIL]").red().bold()));
}

/// Indented detail line under a status line (pod listings, log tails).
pub fn detail(msg: impl Display) {
    line(format!("       {}", style(msg).dim()));
}
