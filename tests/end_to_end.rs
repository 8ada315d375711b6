//! End-to-end pipeline scenarios
//!
//! Each scenario drives the public surface the way a real suite would:
//! register a snapshot against a source file, compare, run the rewrite
//! engine, and check the file byte-for-byte.

use std::fs;
use std::path::PathBuf;

use snap_rewrite::rewrite::update_all;
use snap_rewrite::{golden, CheckFailure, Location, Registry};

/// Deterministic stand-in for an expensive computed value.
fn complicated(s: &str) -> String {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x100_0000_01b3);
    }
    format!("{h:016x}")
}

fn write_source(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn stale_literal_fails_then_updates_then_passes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "hash_test.rs", "fn hash_test() {\n    golden!(\"old\");\n}\n");

    let value = complicated("complicated value");

    // normal mode: exactly one mismatch failure, nothing written
    let registry = Registry::new();
    let snap = registry.register(Location::new(&path, 2), "old");
    let err = snap.compare(&value, false).unwrap_err();
    assert!(matches!(err, CheckFailure::Mismatch { .. }));

    // update mode: the literal is rewritten in place
    let registry = Registry::new();
    let snap = registry.register(Location::new(&path, 2), "old");
    snap.compare(&value, true).unwrap();
    let report = update_all(&registry).unwrap();
    assert_eq!(report.sites_rewritten, 1);

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content, format!("fn hash_test() {{\n    golden!(r\"{value}\");\n}}\n"));

    // a subsequent normal-mode run passes with zero failures
    let registry = Registry::new();
    let snap = registry.register(Location::new(&path, 2), &value);
    assert_eq!(snap.compare(&value, false), Ok(()));
}

#[test]
fn structured_snapshot_updates_with_call_site_indentation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_source(&dir, "json_test.rs", "fn json_test() {\n    golden!(\"outdated\");\n}\n");

    let registry = Registry::new();
    let snap = registry.register(Location::new(&path, 2), "outdated");
    snap.compare_json(&vec!["huh", "ok"], true).unwrap();
    update_all(&registry).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "fn json_test() {\n    golden!(r#\"[\n      \"huh\",\n      \"ok\"\n    ]\"#);\n}\n"
    );

    // a later run still matches even when the literal's indentation was
    // reshuffled by a formatter
    let reformatted = "[\n\"huh\",\n        \"ok\"\n]";
    let registry = Registry::new();
    let snap = registry.register(Location::new(&path, 2), reformatted);
    assert_eq!(snap.compare_json(&vec!["huh", "ok"], false), Ok(()));
}

#[test]
fn looped_call_keeps_its_literal_and_is_not_a_lost_update() {
    let dir = tempfile::tempdir().unwrap();
    let original = "fn loop_test() {\n    for i in 0..2 {\n        golden!(\"stays\");\n    }\n}\n";
    let path = write_source(&dir, "loop_test.rs", original);

    let registry = Registry::new();
    let snap = registry.register(Location::new(&path, 3), "stays");
    snap.compare("first pass", true).unwrap();
    let err = snap.compare("second pass", true).unwrap_err();
    assert!(matches!(err, CheckFailure::ComparedTwice { .. }));

    let report = update_all(&registry).unwrap();
    assert_eq!(report.sites_rewritten, 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn only_observed_sites_change_in_a_many_site_file() {
    let dir = tempfile::tempdir().unwrap();
    let original = concat!(
        "// header comment stays put\n",
        "fn many() {\n",
        "    golden!(\"one\");\n",
        "\n",
        "    golden!(\"two\"); // trailing note\n",
        "    golden!(\"three\");\n",
        "}\n",
    );
    let path = write_source(&dir, "many_test.rs", original);

    let registry = Registry::new();
    let first = registry.register(Location::new(&path, 3), "one");
    let third = registry.register(Location::new(&path, 6), "three");
    first.compare("ONE", true).unwrap();
    third.compare("THREE", true).unwrap();

    let report = update_all(&registry).unwrap();
    assert_eq!(report.sites_rewritten, 2);

    let expected = concat!(
        "// header comment stays put\n",
        "fn many() {\n",
        "    golden!(r\"ONE\");\n",
        "\n",
        "    golden!(\"two\"); // trailing note\n",
        "    golden!(r\"THREE\");\n",
        "}\n",
    );
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
}

#[test]
fn golden_macro_captures_this_call_site() {
    let line = line!() + 1;
    let snap = golden!("live value");
    assert_eq!(snap.location().line(), line);
    assert!(snap.location().file().ends_with("end_to_end.rs"));
    assert_eq!(snap.expected(), "live value");
    snap.check_str("live value");
}

#[test]
fn check_str_panics_with_a_diff_on_mismatch() {
    let snap = golden!("expected text");
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        snap.check_str("actual text");
    }));
    let payload = result.unwrap_err();
    let message = payload.downcast_ref::<String>().unwrap();
    assert!(message.contains("differs"));
    assert!(message.contains("--update-snapshots"));
}
