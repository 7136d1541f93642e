//! Bracket balance checking.
//!
//! The scan is strict: a `]` with no open `[` before it is rejected even if
//! the totals would later even out, so `][` is not balanced.

use crate::error::{ScriptError, UnmatchedBracketKind};

/// Returns true iff every `[` in `script` has a matching `]` after it and
/// every `]` has a matching `[` before it.
pub fn validate(script: &str) -> bool {
    let mut depth: i64 = 0;
    for c in script.chars() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

/// Like [`validate`], but reports where the script went wrong.
///
/// A stray `]` is reported at its own index. Leftover `[` are reported at
/// the innermost one still open when the scan ends.
pub fn check(code: &[char]) -> Result<(), ScriptError> {
    let mut open: Vec<usize> = Vec::new();
    for (i, &c) in code.iter().enumerate() {
        match c {
            '[' => open.push(i),
            ']' => {
                if open.pop().is_none() {
                    return Err(ScriptError::Unbalanced {
                        ip: i,
                        kind: UnmatchedBracketKind::Close,
                    });
                }
            }
            _ => {}
        }
    }

    match open.last() {
        Some(&ip) => Err(ScriptError::Unbalanced {
            ip,
            kind: UnmatchedBracketKind::Open,
        }),
        None => Ok(()),
    }
}
