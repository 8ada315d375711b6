//! The rewrite engine: splices observed values over stale golden literals.
//!
//! Runs once, single-threaded, after the whole suite has finished. Each file
//! with at least one registered snapshot is re-lexed from scratch; between
//! `golden!(` calls every byte is copied verbatim, so comments, blank lines,
//! and unrelated code survive untouched. Only the argument span of a call
//! with exactly one observed value is replaced.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::format::format_literal;
use crate::lex::{LexError, Lexer, Token, TokenKind};
use crate::location::Location;
use crate::registry::Registry;
use crate::snapshot::Snapshot;
use crate::validate;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan {path}: {source}")]
    Scan {
        path: PathBuf,
        #[source]
        source: LexError,
    },

    #[error("unexpected end of {path} while consuming snapshot arguments")]
    UnexpectedEof { path: PathBuf },

    #[error("rewriting {path} would introduce a syntax error: {message}")]
    Reparse { path: PathBuf, message: String },

    #[error("failed to update snapshot at {location}: no golden! call found while rescanning")]
    LostUpdate { location: Location },
}

/// Counters from one update pass, for the run controller's summary.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub sites_rewritten: usize,
    /// Call sites with a record that could not be rewritten: either no value
    /// was observed (skipped test) or the snapshot was compared more than
    /// once.
    pub sites_skipped: usize,
}

/// Rewrite every registered file, then verify no observed value was lost.
///
/// A record that received an actual value but was never matched by the scan
/// is fatal: silently dropping the update would leave the suite red with no
/// recourse. Records compared more than once are exempt; their literal is
/// deliberately left alone.
pub fn update_all(registry: &Registry) -> Result<UpdateReport, RewriteError> {
    let snapshots = registry.snapshots();

    let mut by_file: BTreeMap<PathBuf, Vec<Snapshot>> = BTreeMap::new();
    for snapshot in &snapshots {
        by_file
            .entry(snapshot.location().file().to_path_buf())
            .or_default()
            .push(snapshot.clone());
    }

    let mut report = UpdateReport::default();
    for (path, file_snapshots) in &by_file {
        update_file(path, file_snapshots, &mut report)?;
        report.files_scanned += 1;
    }

    for snapshot in &snapshots {
        let state = snapshot.state();
        if state.has_actual && !state.called_multiple && !state.rewritten {
            return Err(RewriteError::LostUpdate {
                location: snapshot.location().clone(),
            });
        }
    }

    Ok(report)
}

/// The fixed token sequence that spells a call head: `golden` `!` `(`.
/// Returns the head identifier and the opening parenthesis on a match.
fn matched_call(recent: &[Option<Token>; 3]) -> Option<(&Token, &Token)> {
    match (&recent[0], &recent[1], &recent[2]) {
        (Some(head), Some(bang), Some(lparen))
            if matches!(&head.kind, TokenKind::Ident(name) if name == "golden")
                && bang.kind == TokenKind::Punct('!')
                && lparen.kind == TokenKind::Punct('(') =>
        {
            Some((head, lparen))
        }
        _ => None,
    }
}

fn update_file(
    path: &Path,
    snapshots: &[Snapshot],
    report: &mut UpdateReport,
) -> Result<(), RewriteError> {
    let source = fs::read_to_string(path).map_err(|source| RewriteError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let by_line: HashMap<u32, &Snapshot> = snapshots
        .iter()
        .map(|snapshot| (snapshot.location().line(), snapshot))
        .collect();

    let mut lexer = Lexer::new(&source);
    let mut out = String::with_capacity(source.len());
    // end of the last region already copied or rewritten
    let mut prev_offset = 0usize;
    let mut recent: [Option<Token>; 3] = [None, None, None];

    loop {
        let token = lexer.next_token().map_err(|source| RewriteError::Scan {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(token) = token else { break };

        recent.rotate_left(1);
        recent[2] = Some(token);
        let Some((head, lparen)) = matched_call(&recent) else {
            continue;
        };

        // the call might belong to a skipped test, or not be ours at all
        let Some(snapshot) = by_line.get(&head.line) else {
            continue;
        };
        let state = snapshot.state();
        if !state.has_actual || state.called_multiple {
            report.sites_skipped += 1;
            continue;
        }

        let indent = if state.indent_ok {
            line_indent(&source, head.offset)
        } else {
            ""
        };
        let formatted = format_literal(&state.actual, indent);

        // copy all non-snapshot code verbatim, then the new argument list
        out.push_str(&source[prev_offset..lparen.offset]);
        out.push('(');
        out.push_str(&formatted);
        out.push(')');

        let close = consume_arguments(&mut lexer, path)?;
        prev_offset = close.end();

        snapshot.mark_rewritten();
        report.sites_rewritten += 1;
        recent = [None, None, None];
    }

    out.push_str(&source[prev_offset..]);

    if out != source {
        validate::ensure_reparses(&source, &out).map_err(|message| RewriteError::Reparse {
            path: path.to_path_buf(),
            message,
        })?;
        atomic_write(path, out.as_bytes()).map_err(|source| RewriteError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        report.files_changed += 1;
    }

    Ok(())
}

/// Discard the stale argument tokens, tracking nested parenthesis depth,
/// and return the closing parenthesis of the original call.
fn consume_arguments(lexer: &mut Lexer<'_>, path: &Path) -> Result<Token, RewriteError> {
    let mut depth = 1usize;
    loop {
        let token = lexer.next_token().map_err(|source| RewriteError::Scan {
            path: path.to_path_buf(),
            source,
        })?;
        let Some(token) = token else {
            return Err(RewriteError::UnexpectedEof {
                path: path.to_path_buf(),
            });
        };
        match token.kind {
            TokenKind::Punct('(') => depth += 1,
            TokenKind::Punct(')') => {
                depth -= 1;
                if depth == 0 {
                    return Ok(token);
                }
            }
            _ => {}
        }
    }
}

/// Leading whitespace of the line containing `offset`.
fn line_indent(source: &str, offset: usize) -> &str {
    let line_start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = &source[line_start..];
    let indent_len = line
        .bytes()
        .take_while(|&b| b == b' ' || b == b'\t')
        .count();
    &line[..indent_len]
}

/// Atomic file replacement: tempfile in the same directory + fsync + rename,
/// then an mtime refresh so incremental builds notice the change.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    filetime::set_file_mtime(path, filetime::FileTime::now())?;

    Ok(())
}
