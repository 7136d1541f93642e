use clap::Args;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::{Duration, Instant};
use tapebf::cli_util::{exit, exit_code, print_error};
use tapebf::config::{RunOverrides, RunSettings};
use tapebf::{
    Error, ExecError, Halted, Interpreter, MatchStrategy, StepControl, StreamInput, StreamOutput,
    StringInput,
};
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Why the main thread stopped waiting before the worker reported back.
enum Abort {
    Interrupted,
    TimedOut,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Log every dispatched instruction to stderr
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Read the script from PATH instead of positional arguments
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<String>,

    /// Feed TEXT to `,` instead of streaming stdin
    #[arg(short = 'i', long = "input", value_name = "TEXT")]
    pub input: Option<String>,

    /// Wall-clock timeout in milliseconds (fallback TAPEBF_TIMEOUT_MS; default 2_000,
    /// or none while `,` reads a terminal)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps before abort (fallback TAPEBF_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<usize>,

    /// Loop matching strategy: `table` or `scan` (fallback TAPEBF_RESOLVER; default table)
    #[arg(long = "resolver", value_name = "STRATEGY")]
    pub resolver: Option<MatchStrategy>,

    /// Script parts, concatenated
    #[arg(value_name = "SCRIPT", trailing_var_arg = true, allow_hyphen_values = true)]
    pub code: Vec<String>,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    let RunArgs {
        debug,
        file,
        input,
        timeout_ms,
        max_steps,
        resolver,
        code,
    } = args;

    let script = match super::load_script(program, file, code) {
        Ok(s) => s,
        Err(status) => return status,
    };

    let settings = RunSettings::resolve(&RunOverrides {
        timeout_ms,
        max_steps,
        resolver,
        debug,
    });
    crate::init_logging(&settings);

    // Validate up front so a bad script never touches stdin or stdout
    let interpreter = match Interpreter::new(&script) {
        Ok(i) => i.with_strategy(settings.resolver),
        Err(err) => {
            print_error(Some(program), &script, &Error::Script(err));
            return exit::INVALID_SCRIPT;
        }
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        let interrupted = interrupted.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            interrupted.store(true, Ordering::Relaxed);
            cancel.store(true, Ordering::Relaxed);
        }) {
            warn!("failed to set ctrl+c handler: {e}");
        }
    }

    // Execute on a worker thread with cooperative cancellation
    let (tx, rx) = mpsc::channel::<Result<Halted, ExecError>>();
    let ctrl = StepControl::new(settings.max_steps, cancel.clone());
    let interactive = input.is_none() && io::stdin().is_terminal();
    let limit = settings.wall_clock_limit(interactive);
    info!(
        len = interpreter.code().len(),
        resolver = ?settings.resolver,
        max_steps = ?settings.max_steps,
        timeout = ?limit,
        "starting run"
    );

    thread::spawn(move || {
        let output = StreamOutput::new(io::stdout().lock());
        let res = match input {
            Some(text) => interpreter.run_with_control(StringInput::new(&text), output, &ctrl),
            None => interpreter.run_with_control(StreamInput::new(io::stdin().lock()), output, &ctrl),
        };
        let _ = tx.send(res);
    });

    let deadline = limit.map(|d| Instant::now() + d);
    let received = loop {
        match rx.recv_timeout(POLL_INTERVAL) {
            Err(mpsc::RecvTimeoutError::Timeout) => {
                // A worker blocked on stdin never sees the cancel flag
                if interrupted.load(Ordering::Relaxed) {
                    break Err(Abort::Interrupted);
                }
                if deadline.is_some_and(|d| Instant::now() >= d) {
                    break Err(Abort::TimedOut);
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => return exit::INTERNAL,
            Ok(res) => break Ok(res),
        }
    };

    match received {
        Ok(Ok(halted)) => {
            debug!(steps = halted.steps, "run finished");
            exit::OK
        }
        Ok(Err(ExecError::Canceled)) | Err(Abort::Interrupted)
            if interrupted.load(Ordering::Relaxed) =>
        {
            eprintln!("Execution aborted: interrupted");
            let _ = io::stderr().flush();
            exit::ABORTED
        }
        Ok(Err(err)) => {
            let err = Error::Exec(err);
            print_error(Some(program), &script, &err);
            exit_code(&err)
        }
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            // Give the worker a moment to stop and flush what it already wrote.
            // It may be blocked on stdin, in which case it is abandoned.
            let _ = rx.recv_timeout(Duration::from_millis(100));
            let ms = limit.map_or(0, |d| d.as_millis());
            eprintln!("Execution aborted: wall-clock timeout exceeded ({ms} ms)");
            let _ = io::stderr().flush();
            exit::ABORTED
        }
    }
}
