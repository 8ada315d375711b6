//! Process-wide snapshot registry.
//!
//! The registry correlates a call site with its snapshot record: tests
//! populate it while they run, the rewrite engine reads it once after the
//! suite has quiesced. Only the insertion path needs mutual exclusion;
//! record fields are guarded per record.

use std::collections::HashMap;
use std::sync::Mutex;

use colored::Colorize;
use once_cell::sync::Lazy;
use thiserror::Error;

use crate::location::Location;
use crate::snapshot::Snapshot;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

#[derive(Error, Debug)]
#[error("two snapshots registered at {location}; only one golden! call per line is supported")]
pub(crate) struct DuplicateLocation {
    pub(crate) location: Location,
}

/// Mapping from [`Location`] to snapshot record, exclusive per location.
#[derive(Debug, Default)]
pub struct Registry {
    by_location: Mutex<HashMap<Location, Snapshot>>,
}

impl Registry {
    /// Create an empty registry. Tests and embedders can use their own
    /// instance; [`golden!`](crate::golden) registers into [`global`](Self::global).
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by the whole test binary.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Register a snapshot at an explicit location.
    ///
    /// This is the fallback for call sites that cannot use the [`golden!`]
    /// macro's automatic capture. A second registration at the same location
    /// is a programming error in the suite and aborts the process: the
    /// rewrite engine could never decide which literal to update.
    ///
    /// [`golden!`]: crate::golden
    pub fn register(&self, location: Location, expected: &str) -> Snapshot {
        match self.try_register(location, expected) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                eprintln!("{} {err}", "error:".red().bold());
                std::process::exit(1);
            }
        }
    }

    pub(crate) fn try_register(
        &self,
        location: Location,
        expected: &str,
    ) -> Result<Snapshot, DuplicateLocation> {
        let snapshot = Snapshot::new(location.clone(), expected);
        let mut map = self.by_location.lock().unwrap();
        if map.contains_key(&location) {
            return Err(DuplicateLocation { location });
        }
        map.insert(location, snapshot.clone());
        Ok(snapshot)
    }

    /// Clone out every registered snapshot. Handles share their records, so
    /// the rewrite engine sees all observed values.
    pub(crate) fn snapshots(&self) -> Vec<Snapshot> {
        self.by_location.lock().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.by_location.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
