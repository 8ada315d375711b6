//! Turns observed snapshot values back into Rust string literal tokens.
//!
//! The formatter prefers a raw literal (`r"..."`, `r#"..."#`) so multi-line
//! values stay readable in source; values that a raw literal cannot express
//! fall back to a conventionally escaped quoted literal.

/// Format a value as a Rust string literal token.
///
/// `indent` is the leading whitespace of the line containing the call. When
/// non-empty, it is prefixed to every continuation line of a multi-line raw
/// literal so the rewritten source lines up with the call site. Escaped
/// literals are always a single line and ignore it.
pub fn format_literal(value: &str, indent: &str) -> String {
    if !raw_compatible(value) {
        // Debug formatting of str produces a valid, escaped Rust literal.
        return format!("{value:?}");
    }

    let hashes = raw_hash_count(value);
    let mut out = String::with_capacity(value.len() + hashes * 2 + 3);
    out.push('r');
    for _ in 0..hashes {
        out.push('#');
    }
    out.push('"');
    if indent.is_empty() {
        out.push_str(value);
    } else {
        for (i, line) in value.split('\n').enumerate() {
            if i > 0 {
                out.push('\n');
                out.push_str(indent);
            }
            out.push_str(line);
        }
    }
    out.push('"');
    for _ in 0..hashes {
        out.push('#');
    }
    out
}

/// A raw literal can hold any text without control characters, except that
/// `\n` and `\t` are fine. A bare `\r` in particular has no raw spelling.
fn raw_compatible(value: &str) -> bool {
    value
        .chars()
        .all(|c| c == '\n' || c == '\t' || !c.is_control())
}

/// Smallest hash count whose closing delimiter cannot occur in the payload.
///
/// A raw literal with `n` hashes terminates at `"` followed by `n` hashes,
/// so `n` must exceed the longest run of `#` directly after any `"` in the
/// value. A value without `"` needs no hashes at all.
fn raw_hash_count(value: &str) -> usize {
    let bytes = value.as_bytes();
    let mut max_run: Option<usize> = None;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'"' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] == b'#' {
                j += 1;
            }
            let run = j - i - 1;
            max_run = Some(max_run.map_or(run, |m| m.max(run)));
            i = j;
        } else {
            i += 1;
        }
    }
    match max_run {
        None => 0,
        Some(run) => run + 1,
    }
}

/// Decode a string literal token back to its value.
///
/// Understands the two shapes the formatter emits: raw literals with any
/// hash count, and escaped quoted literals using the escapes that `{:?}`
/// produces (`\n`, `\r`, `\t`, `\0`, `\\`, `\"`, `\'`, `\u{..}`).
pub(crate) fn decode_literal(literal: &str) -> Option<String> {
    if let Some(rest) = literal.strip_prefix('r') {
        let hashes = rest.bytes().take_while(|&b| b == b'#').count();
        let rest = &rest[hashes..];
        let inner = rest
            .strip_prefix('"')?
            .strip_suffix(&format!("\"{}", "#".repeat(hashes)))?;
        return Some(inner.to_string());
    }

    let inner = literal.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            '0' => out.push('\0'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let mut hex = String::new();
                loop {
                    match chars.next()? {
                        '}' => break,
                        d => hex.push(d),
                    }
                }
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(out)
}
