//! A fixed-tape Brainfuck interpreter library.
//!
//! Scripts run on a tape of [`DEFAULT_CELLS`] 8-bit cells with a single
//! cursor.
//!
//! Features and behaviors:
//! - Memory tape initialized to 0; cell arithmetic wraps modulo 256.
//! - The cursor wraps: moving right from the last cell lands on cell 0 and
//!   moving left from cell 0 lands on the last cell.
//! - Brackets are validated before anything runs. `][` is rejected even
//!   though its counts balance.
//! - Input `,` reads a single byte; when the source is exhausted the run
//!   stops with [`ExecError::NoMoreInput`]. Output already written stays written.
//! - Output `.` writes the byte at the current cell.
//! - Characters outside `><+-.,[]` are comments.
//!
//! Quick start:
//!
//! ```
//! let out = tapebf::run_string(",[.,]", "echo").unwrap_err();
//! // the echo loop asks for one byte more than there is
//! assert!(matches!(
//!     out,
//!     tapebf::Error::Exec(tapebf::ExecError::NoMoreInput { .. })
//! ));
//!
//! let hello = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.";
//! assert_eq!(tapebf::run_string(hello, "").unwrap(), "Hello");
//! ```

pub mod cli_util;
pub mod config;
pub mod engine;
pub mod error;
pub mod instruction;
pub mod io;
pub mod resolve;
pub mod tape;
pub mod validate;

use std::io::{Read, Write};

pub use engine::{Halted, Interpreter, StepControl};
pub use error::{Error, ExecError, InvariantViolation, ScriptError, UnmatchedBracketKind};
pub use instruction::Instruction;
pub use io::{ByteInput, ByteOutput, StreamInput, StreamOutput, StringInput, StringOutput};
pub use resolve::{JumpTable, MatchStrategy, find_match};
pub use tape::{DEFAULT_CELLS, Tape};
pub use validate::validate;

/// Run `script` reading from `input` and writing to `output` as it goes.
///
/// `output` is flushed when the run ends, successful or not.
pub fn run_stream<R: Read, W: Write>(script: &str, input: R, output: W) -> Result<(), Error> {
    let interpreter = Interpreter::new(script)?;
    interpreter.run(StreamInput::new(input), StreamOutput::new(output))?;
    Ok(())
}

/// Run `script` against the characters of `input` and return what it printed.
///
/// Each input character is one cell value, so only U+0000 to U+00FF can be
/// read; a wider character fails that read with [`ExecError::Io`]. Each output
/// byte comes back as the character of the same value. On error the partial
/// output is dropped; run an [`Interpreter`] against a [`StringOutput`] to
/// keep it.
pub fn run_string(script: &str, input: &str) -> Result<String, Error> {
    let interpreter = Interpreter::new(script)?;
    let mut output = StringOutput::new();
    interpreter.run(StringInput::new(input), &mut output)?;
    Ok(output.into_string())
}
