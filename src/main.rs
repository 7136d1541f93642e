use clap::{Parser, Subcommand};
use std::env;
use std::io::{self, IsTerminal};
use tapebf::config::RunSettings;
use tracing::warn;

mod commands;

use commands::{check::CheckArgs, run::RunArgs};

#[derive(Parser, Debug)]
#[command(
    name = "tapebf",
    version,
    about = "Run Brainfuck scripts on a fixed, wrapping tape",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a script; `,` reads stdin (or --input) and `.` writes stdout
    Run(RunArgs),
    /// Check that a script's brackets balance without running it
    Check(CheckArgs),
}

/// Install the stderr log subscriber, then report settings that were ignored.
pub(crate) fn init_logging(settings: &RunSettings) {
    let _ = tracing_subscriber::fmt()
        .with_max_level(settings.log_level)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .compact()
        .try_init();

    for warning in &settings.warnings {
        warn!("{warning}");
    }
}

fn main() {
    // We still pull the program name for message prefixes
    let program = env::args().next().unwrap_or_else(|| String::from("tapebf"));

    let cli = Cli::parse();

    let code = match cli.command {
        Command::Run(args) => commands::run::run(&program, args),
        Command::Check(args) => commands::check::run(&program, args),
    };

    std::process::exit(code);
}
