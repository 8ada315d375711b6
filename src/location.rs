use std::fmt;
use std::path::{Path, PathBuf};

/// A call site: the file and line a snapshot was registered from.
///
/// Locations are the unique key into the [`Registry`](crate::Registry); two
/// snapshots may never share one, because the rewrite engine could not tell
/// which literal on the line to replace.
///
/// The file path is stored exactly as the compiler embedded it. Relative
/// paths are resolved against the current directory at rewrite time, which
/// matches how cargo runs test binaries (from the package root).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    file: PathBuf,
    line: u32,
}

impl Location {
    /// Create a location from a file path and 1-based line number.
    pub fn new(file: impl Into<PathBuf>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// The source file containing the call.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The 1-based line the call starts on.
    pub fn line(&self) -> u32 {
        self.line
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_file_colon_line() {
        let loc = Location::new("tests/demo.rs", 17);
        assert_eq!(loc.to_string(), "tests/demo.rs:17");
    }

    #[test]
    fn locations_differ_by_line() {
        let a = Location::new("a.rs", 1);
        let b = Location::new("a.rs", 2);
        assert_ne!(a, b);
        assert_eq!(a, Location::new("a.rs", 1));
    }
}
