use std::io::{self, Write};

use crate::{Error, ExecError, ScriptError};

/// Process exit codes used by the `tapebf` binary.
pub mod exit {
    pub const OK: i32 = 0;
    /// Timeout, step limit or Ctrl+C.
    pub const ABORTED: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NO_MORE_INPUT: i32 = 3;
    pub const IO_FAILURE: i32 = 4;
    pub const INVALID_SCRIPT: i32 = 5;
    pub const INTERNAL: i32 = 70;
}

/// Exit code for a failed run. Each error kind gets its own code.
pub fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Script(_) => exit::INVALID_SCRIPT,
        Error::Exec(ExecError::NoMoreInput { .. }) => exit::NO_MORE_INPUT,
        Error::Exec(ExecError::Io { .. }) => exit::IO_FAILURE,
        Error::Exec(ExecError::Internal(_)) => exit::INTERNAL,
        Error::Exec(ExecError::StepLimitExceeded { .. } | ExecError::Canceled) => exit::ABORTED,
    }
}

/// Render an error for the terminal: one message line, then a caret context
/// window under the offending instruction when the error has a position.
/// If `program` is `Some("tapebf")`, the message is prefixed with "tapebf: ".
pub fn render_error(program: Option<&str>, code: &str, err: &Error) -> String {
    let (msg, ip) = match err {
        Error::Script(ScriptError::Unbalanced { ip, kind }) => {
            (format!("Parse error: unmatched bracket {kind}"), Some(*ip))
        }
        Error::Exec(ExecError::NoMoreInput { ip }) => {
            ("Runtime error: no more input".to_string(), Some(*ip))
        }
        Error::Exec(ExecError::Io { ip, source }) => (format!("I/O error: {source}"), Some(*ip)),
        Error::Exec(ExecError::Internal(violation)) => {
            (format!("Internal error: {violation}"), Some(violation.ip()))
        }
        Error::Exec(other) => (other.to_string(), None),
    };

    let msg = match program {
        Some(p) => format!("{p}: {msg}"),
        None => msg,
    };

    match ip {
        Some(pos) => {
            let (window, caret) = context_window(code, pos);
            format!("{msg} at instruction {pos}\n  {window}\n  {caret}\n")
        }
        None => format!("{msg}\n"),
    }
}

/// Write [`render_error`] output to stderr and flush.
pub fn print_error(program: Option<&str>, code: &str, err: &Error) {
    eprint!("{}", render_error(program, code, err));
    let _ = io::stderr().flush();
}

/// A short slice of `code` around char index `pos`, plus a line with a caret
/// under `pos`. Whitespace in the slice is flattened to spaces so the caret
/// stays aligned when the script spans several lines.
fn context_window(code: &str, pos: usize) -> (String, String) {
    const WINDOW_CHARS: usize = 32;

    let start = pos.saturating_sub(WINDOW_CHARS);
    let window: String = code
        .chars()
        .skip(start)
        .take(pos - start + WINDOW_CHARS + 1)
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    let mut caret = " ".repeat(pos - start);
    caret.push('^');
    (window, caret)
}
