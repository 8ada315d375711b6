//! The run controller for `harness = false` test binaries.
//!
//! Ties process lifetime to registry lifetime: the suite runs to completion,
//! then (only in update mode) the rewrite engine consumes the registry
//! exactly once, and the process exits with the suite's status.

use clap::Parser;
use colored::Colorize;
use once_cell::sync::OnceCell;

use crate::registry::Registry;
use crate::rewrite;

static UPDATE_MODE: OnceCell<bool> = OnceCell::new();

/// Whether this run should rewrite stale literals instead of failing on
/// them. Set by [`run`]'s `--update-snapshots` flag; under a stock libtest
/// harness (where [`run`] never executes) the `UPDATE_SNAPSHOTS` environment
/// variable is consulted instead.
pub fn update_enabled() -> bool {
    *UPDATE_MODE.get_or_init(|| match std::env::var_os("UPDATE_SNAPSHOTS") {
        Some(value) => !value.is_empty() && value != "0",
        None => false,
    })
}

#[derive(Parser, Debug)]
#[command(name = "snap-rewrite", about = "Source-based snapshot test runner")]
struct RunArgs {
    /// Rewrite stale golden literals in place after the suite finishes
    #[arg(long)]
    update_snapshots: bool,
}

/// Run a test suite, then update snapshots if requested, then exit.
///
/// The closure is the test-execution handle: it runs every test and returns
/// the exit status the process should report (0 for a green suite). Any
/// snapshot in a test the closure skipped simply keeps its literal.
///
/// Rewrite failures are fatal with a non-zero status; files already
/// rewritten before the failure stay rewritten, since each file's rewrite is
/// self-contained and idempotent on retry.
pub fn run<F>(suite: F) -> !
where
    F: FnOnce() -> i32,
{
    let args = RunArgs::parse();
    if args.update_snapshots {
        let _ = UPDATE_MODE.set(true);
    }

    let code = suite();

    if update_enabled() {
        match rewrite::update_all(Registry::global()) {
            Ok(report) => {
                println!("{}", "Snapshot update".bold());
                println!("  {} files scanned", report.files_scanned);
                println!(
                    "  {} files changed",
                    format!("{}", report.files_changed).green()
                );
                println!(
                    "  {} literals rewritten",
                    format!("{}", report.sites_rewritten).green()
                );
                if report.sites_skipped > 0 {
                    println!(
                        "  {} sites skipped (no value, or compared more than once)",
                        format!("{}", report.sites_skipped).yellow()
                    );
                }
            }
            Err(err) => {
                let err = anyhow::Error::new(err).context("updating snapshots");
                eprintln!("{} {err:#}", "error:".red().bold());
                std::process::exit(1);
            }
        }
    }

    std::process::exit(code);
}
