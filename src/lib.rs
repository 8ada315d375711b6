//! Snap Rewrite: self-updating inline snapshot assertions for Rust
//!
//! A snapshot library that keeps expected "golden" values as literals inside
//! the test source itself and can rewrite those literals in place when the
//! actual values change.
//!
//! # Architecture
//!
//! A test registers a golden literal with [`golden!`], which captures the
//! call site and records it in a process-wide [`Registry`]. Check methods on
//! [`Snapshot`] compare the actual value and remember it. After the whole
//! suite has run, the rewrite engine re-lexes every file with a registered
//! snapshot, finds each `golden!(` call, and splices the observed value over
//! the stale literal while copying every other byte verbatim.
//!
//! # Safety
//!
//! - Rewrites are token-based: comments, blank lines, and unrelated code are
//!   reproduced byte-for-byte
//! - Rewritten files are re-parsed with syn before being persisted
//! - Atomic file writes (tempfile + fsync + rename)
//! - Files are only written when their content actually changed
//!
//! # Example
//!
//! A complete test binary using `harness = false`. The snapshot is out of
//! date: it should mention "complicated value" but instead says "old".
//!
//! ```no_run
//! use snap_rewrite::golden;
//!
//! fn test_snapshot() {
//!     let magic = "complicated value";
//!     golden!("old").check_str(magic);
//! }
//!
//! fn main() {
//!     snap_rewrite::run(|| {
//!         test_snapshot();
//!         0
//!     });
//! }
//! ```
//!
//! Running the binary fails because the snapshot is stale. Running it with
//! `--update-snapshots` rewrites the literal to `golden!("complicated value")`
//! and afterwards the test passes.

pub mod format;
pub mod lex;
pub mod location;
pub mod registry;
pub mod rewrite;
pub mod runner;
pub mod snapshot;

mod validate;

// Re-exports
pub use location::Location;
pub use registry::Registry;
pub use rewrite::{RewriteError, UpdateReport};
pub use runner::{run, update_enabled};
pub use snapshot::{CheckFailure, Snapshot};

/// Creates a self-updating [`Snapshot`] from an inline golden literal.
///
/// The macro captures the file and line of its own invocation; the rewrite
/// engine later finds the call lexically, so at most one `golden!` call per
/// source line is supported and the literal must sit directly between the
/// macro's parentheses.
///
/// Each snapshot must be checked exactly once, with [`Snapshot::check_str`]
/// or [`Snapshot::check_json`].
#[macro_export]
macro_rules! golden {
    ($expected:expr $(,)?) => {
        $crate::Snapshot::capture($expected)
    };
}
