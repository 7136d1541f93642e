pub mod check;
pub mod run;

use std::fs;
use std::io::{self, Write};

use tapebf::cli_util::exit;

/// Script text from `--file` or from the concatenated positional parts.
///
/// Returns the exit code to use when neither or both were given, or when
/// the file cannot be read.
pub fn load_script(program: &str, file: Option<String>, parts: Vec<String>) -> Result<String, i32> {
    match (file, parts.is_empty()) {
        (Some(_), false) => {
            eprintln!("{program}: cannot use positional script together with --file");
            let _ = io::stderr().flush();
            Err(exit::USAGE)
        }
        (None, true) => {
            eprintln!("{program}: no script given (pass it as arguments or with --file)");
            let _ = io::stderr().flush();
            Err(exit::USAGE)
        }
        (Some(path), true) => fs::read_to_string(&path).map_err(|e| {
            eprintln!("{program}: failed to read script file {path}: {e}");
            let _ = io::stderr().flush();
            exit::IO_FAILURE
        }),
        (None, false) => Ok(parts.join("")),
    }
}
