use clap::Args;
use tapebf::cli_util::{exit, print_error};
use tapebf::config::{RunOverrides, RunSettings};
use tapebf::{Error, validate};
use tracing::debug;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Read the script from PATH instead of positional arguments
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<String>,

    /// Script parts, concatenated
    #[arg(value_name = "SCRIPT", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,
}

pub fn run(program: &str, args: CheckArgs) -> i32 {
    let CheckArgs { file, code } = args;

    let script = match super::load_script(program, file, code) {
        Ok(s) => s,
        Err(status) => return status,
    };

    crate::init_logging(&RunSettings::resolve(&RunOverrides::default()));

    let chars: Vec<char> = script.chars().collect();
    match validate::check(&chars) {
        Ok(()) => {
            debug!(len = chars.len(), "script is balanced");
            println!("ok");
            exit::OK
        }
        Err(err) => {
            print_error(Some(program), &script, &Error::Script(err));
            exit::INVALID_SCRIPT
        }
    }
}
