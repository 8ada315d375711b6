//! Post-rewrite parse validation.
//!
//! Before a rewritten file is persisted, the new text must parse as Rust.
//! A file the original author had already broken is let through unchanged
//! in spirit: the rewrite is only rejected for errors it introduced.

/// Check that `rewritten` parses, unless `original` already failed to.
///
/// Returns the parse error message when the rewrite is to blame.
pub(crate) fn ensure_reparses(original: &str, rewritten: &str) -> Result<(), String> {
    match syn::parse_file(rewritten) {
        Ok(_) => Ok(()),
        Err(err) => {
            if syn::parse_file(original).is_err() {
                // not our doing; the lexical scan already succeeded, so the
                // spans we replaced were sound
                Ok(())
            } else {
                Err(err.to_string())
            }
        }
    }
}
