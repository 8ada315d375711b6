//! Snapshot records and the comparison primitives.
//!
//! A [`Snapshot`] is a cheap handle onto the record stored in the registry.
//! Comparison mutates only the targeted record: it remembers the actual
//! value for the rewrite engine and, outside update mode, reports mismatch.

use std::sync::{Arc, Mutex};

use colored::Colorize;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use thiserror::Error;

use crate::location::Location;
use crate::registry::Registry;
use crate::runner;

/// Mutable per-record state, written by the comparator and rewrite engine.
#[derive(Clone, Debug, Default)]
pub(crate) struct RecordState {
    pub(crate) has_actual: bool,
    pub(crate) actual: String,
    pub(crate) called_multiple: bool,
    pub(crate) rewritten: bool,
    pub(crate) indent_ok: bool,
}

#[derive(Debug)]
struct Record {
    location: Location,
    expected: String,
    state: Mutex<RecordState>,
}

/// A comparison outcome that marks the running test as failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    #[error("snapshot at {location} differs; expected {expected:?}, got {actual:?}")]
    Mismatch {
        location: Location,
        expected: String,
        actual: String,
    },

    #[error("snapshot at {location} compared more than once")]
    ComparedTwice { location: Location },

    #[error("could not serialize snapshot value at {location}: {message}")]
    Serialize { location: Location, message: String },
}

/// An expected value registered at one call site.
///
/// Created by [`golden!`](crate::golden) (or [`Registry::register`] with an
/// explicit location) and consumed by exactly one check. Handles clone
/// cheaply and share the underlying record.
#[derive(Clone, Debug)]
pub struct Snapshot {
    record: Arc<Record>,
}

impl Snapshot {
    pub(crate) fn new(location: Location, expected: &str) -> Self {
        Self {
            record: Arc::new(Record {
                location,
                expected: expected.to_string(),
                state: Mutex::new(RecordState::default()),
            }),
        }
    }

    /// Register a snapshot for the caller's own file and line.
    ///
    /// Prefer the [`golden!`](crate::golden) macro, which the rewrite engine
    /// can find lexically; a direct call still compares correctly but cannot
    /// be rewritten.
    #[track_caller]
    pub fn capture(expected: &str) -> Self {
        let caller = std::panic::Location::caller();
        let location = Location::new(caller.file(), caller.line());
        Registry::global().register(location, expected)
    }

    /// The call site this snapshot was registered from.
    pub fn location(&self) -> &Location {
        &self.record.location
    }

    /// The literal currently embedded in source.
    pub fn expected(&self) -> &str {
        &self.record.expected
    }

    /// Compare an actual string against this snapshot, recording it for the
    /// rewrite engine. The non-panicking primitive behind [`check_str`].
    ///
    /// With `update` set, mismatches are not reported: the observed value is
    /// simply recorded so the rewrite engine can splice it into source. A
    /// second comparison on the same snapshot is an error either way, and
    /// permanently excludes the record from rewriting because two observed
    /// values cannot be reconciled into one literal.
    ///
    /// [`check_str`]: Self::check_str
    pub fn compare(&self, actual: &str, update: bool) -> Result<(), CheckFailure> {
        let mut state = self.record.state.lock().unwrap();

        let mut result = Ok(());
        if !update {
            let matches = if state.indent_ok {
                trim_lines(&self.record.expected) == trim_lines(actual)
            } else {
                self.record.expected == actual
            };
            if !matches {
                result = Err(CheckFailure::Mismatch {
                    location: self.record.location.clone(),
                    expected: self.record.expected.clone(),
                    actual: actual.to_string(),
                });
            }
        }

        if state.has_actual {
            state.called_multiple = true;
            result = Err(CheckFailure::ComparedTwice {
                location: self.record.location.clone(),
            });
        }
        state.has_actual = true;
        state.actual = actual.to_string();

        result
    }

    /// Compare a string with the snapshot; panics on mismatch with a
    /// rendered diff. In update mode the actual value is recorded instead
    /// and no mismatch is reported.
    #[track_caller]
    pub fn check_str(&self, actual: &str) {
        if let Err(failure) = self.compare(actual, runner::update_enabled()) {
            panic!("{}", render_failure(&failure));
        }
    }

    /// Compare a structured value against this snapshot. The non-panicking
    /// primitive behind [`check_json`](Self::check_json).
    ///
    /// The value is serialized to its canonical JSON form (two-space indent,
    /// map keys sorted) and compared like a string, except that per-line
    /// leading and trailing whitespace is ignored: the rewrite engine
    /// re-indents multi-line literals to the call site, and reformatting
    /// must not fail the comparison.
    pub fn compare_json<T: Serialize>(&self, value: &T, update: bool) -> Result<(), CheckFailure> {
        let text = canonical_json(value).map_err(|err| CheckFailure::Serialize {
            location: self.record.location.clone(),
            message: err.to_string(),
        })?;
        self.set_indent_ok();
        self.compare(&text, update)
    }

    /// Compare a structured value with the snapshot; panics on mismatch
    /// with a rendered diff, like [`check_str`](Self::check_str).
    #[track_caller]
    pub fn check_json<T: Serialize>(&self, value: &T) {
        if let Err(failure) = self.compare_json(value, runner::update_enabled()) {
            panic!("{}", render_failure(&failure));
        }
    }

    pub(crate) fn set_indent_ok(&self) {
        self.record.state.lock().unwrap().indent_ok = true;
    }

    pub(crate) fn state(&self) -> RecordState {
        self.record.state.lock().unwrap().clone()
    }

    pub(crate) fn mark_rewritten(&self) {
        self.record.state.lock().unwrap().rewritten = true;
    }
}

/// Canonical textual form for structured values: route through
/// `serde_json::Value` so maps serialize with sorted keys.
fn canonical_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string_pretty(&value)
}

/// Collapse a string to its per-line trimmed form for indentation-tolerant
/// comparison.
fn trim_lines(s: &str) -> String {
    s.lines().map(str::trim).collect()
}

fn render_failure(failure: &CheckFailure) -> String {
    match failure {
        CheckFailure::Mismatch {
            location,
            expected,
            actual,
        } => {
            let mut out = format!("snapshot at {location} differs\n");
            let diff = TextDiff::from_lines(expected.as_str(), actual.as_str());
            for change in diff.iter_all_changes() {
                let line = match change.tag() {
                    ChangeTag::Delete => format!("-{change}").red().to_string(),
                    ChangeTag::Insert => format!("+{change}").green().to_string(),
                    ChangeTag::Equal => format!(" {change}").normal().to_string(),
                };
                out.push_str(&line);
            }
            if !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("rerun with --update-snapshots to accept the new value");
            out
        }
        CheckFailure::ComparedTwice { .. } | CheckFailure::Serialize { .. } => failure.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(expected: &str) -> Snapshot {
        Snapshot::new(Location::new("t.rs", 1), expected)
    }

    #[test]
    fn matching_value_passes_and_is_recorded() {
        let snap = snapshot("ok");
        assert_eq!(snap.compare("ok", false), Ok(()));
        let state = snap.state();
        assert!(state.has_actual);
        assert_eq!(state.actual, "ok");
    }

    #[test]
    fn mismatch_reports_both_values() {
        let snap = snapshot("old");
        let err = snap.compare("new", false).unwrap_err();
        match err {
            CheckFailure::Mismatch {
                expected, actual, ..
            } => {
                assert_eq!(expected, "old");
                assert_eq!(actual, "new");
            }
            other => panic!("unexpected failure: {other}"),
        }
        // the actual value is still recorded for the rewrite engine
        assert!(snap.state().has_actual);
    }

    #[test]
    fn update_mode_suppresses_mismatch() {
        let snap = snapshot("old");
        assert_eq!(snap.compare("new", true), Ok(()));
        assert_eq!(snap.state().actual, "new");
    }

    #[test]
    fn second_comparison_is_a_distinct_failure() {
        let snap = snapshot("v");
        snap.compare("v", false).unwrap();
        let err = snap.compare("w", false).unwrap_err();
        assert!(matches!(err, CheckFailure::ComparedTwice { .. }));
        let state = snap.state();
        assert!(state.called_multiple);
    }

    #[test]
    fn indent_tolerant_comparison_ignores_per_line_whitespace() {
        let snap = snapshot("[\n      \"a\"\n    ]");
        snap.set_indent_ok();
        assert_eq!(snap.compare("[\n  \"a\"\n]", false), Ok(()));
    }

    #[test]
    fn strict_comparison_keeps_whitespace_significant() {
        let snap = snapshot("a\n  b");
        assert!(snap.compare("a\nb", false).is_err());
    }

    #[test]
    fn canonical_json_sorts_map_keys() {
        let mut map = std::collections::HashMap::new();
        map.insert("zebra", 1);
        map.insert("apple", 2);
        let text = canonical_json(&map).unwrap();
        assert_eq!(text, "{\n  \"apple\": 2,\n  \"zebra\": 1\n}");
    }

    #[test]
    fn canonical_json_lists_one_item_per_line() {
        let text = canonical_json(&vec!["huh", "ok"]).unwrap();
        assert_eq!(text, "[\n  \"huh\",\n  \"ok\"\n]");
    }

    #[test]
    fn trim_lines_joins_trimmed_content() {
        assert_eq!(trim_lines("  a \n\tb\n"), "ab");
    }
}
