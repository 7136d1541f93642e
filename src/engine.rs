//! The execution loop.
//!
//! An [`Interpreter`] holds a validated script and its jump table and never
//! changes after construction. Each call to [`Interpreter::run`] opens a
//! fresh session with its own zeroed tape and script cursor, drives it until
//! the cursor falls off the end of the script, and hands the final tape back
//! in a [`Halted`] report.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, trace};

use crate::error::{ExecError, InvariantViolation, ScriptError};
use crate::instruction::Instruction;
use crate::io::{ByteInput, ByteOutput};
use crate::resolve::{JumpTable, MatchStrategy, find_match};
use crate::tape::{DEFAULT_CELLS, Tape};
use crate::validate::check;

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone, Debug, Default)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }

    /// Raise the cancellation flag. The session stops before its next step.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }
}

/// State of a session that ran to the end of its script.
#[derive(Debug, Clone)]
pub struct Halted<const N: usize = DEFAULT_CELLS> {
    pub tape: Tape<N>,
    /// Instructions dispatched, comments included.
    pub steps: usize,
}

/// A validated script, ready to run any number of times.
#[derive(Debug, Clone)]
pub struct Interpreter<const N: usize = DEFAULT_CELLS> {
    code: Vec<char>,
    jumps: JumpTable,
    strategy: MatchStrategy,
}

impl Interpreter {
    /// Validate `script` for a tape of [`DEFAULT_CELLS`] cells.
    pub fn new(script: &str) -> Result<Self, ScriptError> {
        Self::with_cells(script)
    }
}

impl<const N: usize> Interpreter<N> {
    /// Validate `script` for a tape of `N` cells.
    pub fn with_cells(script: &str) -> Result<Self, ScriptError> {
        let code: Vec<char> = script.chars().collect();
        check(&code)?;
        let jumps = JumpTable::build(&code);
        debug!(len = code.len(), cells = N, "script validated");
        Ok(Self {
            code,
            jumps,
            strategy: MatchStrategy::default(),
        })
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    pub fn code(&self) -> &[char] {
        &self.code
    }

    /// Run the script to completion.
    ///
    /// The adapters are borrowed for the session only: pass `&mut` to keep
    /// using them afterwards. The output is flushed when the session ends,
    /// also when it ends in an error.
    pub fn run<I, O>(&self, input: I, output: O) -> Result<Halted<N>, ExecError>
    where
        I: ByteInput,
        O: ByteOutput,
    {
        Session::new(self, input, output, None).run()
    }

    /// Execute with cooperative cancellation and optional step limit.
    pub fn run_with_control<I, O>(
        &self,
        input: I,
        output: O,
        control: &StepControl,
    ) -> Result<Halted<N>, ExecError>
    where
        I: ByteInput,
        O: ByteOutput,
    {
        Session::new(self, input, output, Some(control)).run()
    }
}

struct Session<'a, const N: usize, I, O> {
    interpreter: &'a Interpreter<N>,
    control: Option<&'a StepControl>,
    tape: Tape<N>,
    ip: usize,
    steps: usize,
    input: I,
    output: O,
}

impl<'a, const N: usize, I: ByteInput, O: ByteOutput> Session<'a, N, I, O> {
    fn new(
        interpreter: &'a Interpreter<N>,
        input: I,
        output: O,
        control: Option<&'a StepControl>,
    ) -> Self {
        Self {
            interpreter,
            control,
            tape: Tape::new(),
            ip: 0,
            steps: 0,
            input,
            output,
        }
    }

    fn run(mut self) -> Result<Halted<N>, ExecError> {
        let result = self.execute();
        let flushed = self.output.flush();

        match (result, flushed) {
            (Err(err), _) => {
                debug!(ip = self.ip, steps = self.steps, error = %err, "session aborted");
                Err(err)
            }
            (Ok(()), Err(source)) => Err(ExecError::Io { ip: self.ip, source }),
            (Ok(()), Ok(())) => {
                debug!(steps = self.steps, "session halted");
                Ok(Halted {
                    tape: self.tape,
                    steps: self.steps,
                })
            }
        }
    }

    fn execute(&mut self) -> Result<(), ExecError> {
        let interpreter = self.interpreter;
        let code = &interpreter.code;

        while self.ip < code.len() {
            if let Some(ctrl) = self.control {
                if ctrl.cancel_flag.load(Ordering::Relaxed) {
                    return Err(ExecError::Canceled);
                }
                if let Some(max) = ctrl.max_steps {
                    if self.steps >= max {
                        return Err(ExecError::StepLimitExceeded { limit: max });
                    }
                }
            }

            let c = code[self.ip];
            trace!(
                step = self.steps,
                ip = self.ip,
                ptr = self.tape.cursor(),
                cell = self.tape.read(),
                instr = %c,
                "dispatch"
            );

            self.ip = match Instruction::from_char(c) {
                Some(instr) => self.step(instr)?,
                None => self.ip + 1,
            };
            self.steps += 1;
        }

        Ok(())
    }

    /// Apply one instruction and return the next script cursor.
    fn step(&mut self, instr: Instruction) -> Result<usize, ExecError> {
        let ip = self.ip;
        match instr {
            Instruction::Increment => self.tape.increment(),
            Instruction::Decrement => self.tape.decrement(),
            Instruction::MoveRight => self.tape.move_right(),
            Instruction::MoveLeft => self.tape.move_left(),
            Instruction::LoopOpen => {
                if self.tape.read() == 0 {
                    return self.jump_past_partner(ip);
                }
            }
            Instruction::LoopClose => {
                if self.tape.read() != 0 {
                    return self.jump_past_partner(ip);
                }
            }
            Instruction::Output => {
                let byte = self.tape.read();
                self.output
                    .write_byte(byte)
                    .map_err(|source| ExecError::Io { ip, source })?;
            }
            Instruction::Input => match self.input.read_byte() {
                Ok(Some(byte)) => self.tape.write(byte),
                Ok(None) => return Err(ExecError::NoMoreInput { ip }),
                Err(source) => return Err(ExecError::Io { ip, source }),
            },
        }
        Ok(ip + 1)
    }

    fn jump_past_partner(&self, ip: usize) -> Result<usize, ExecError> {
        let target = self.partner(ip)?;
        trace!(ip, target, "jump");
        Ok(target + 1)
    }

    fn partner(&self, ip: usize) -> Result<usize, InvariantViolation> {
        match self.interpreter.strategy {
            MatchStrategy::Scan => find_match(&self.interpreter.code, ip),
            MatchStrategy::Table => self.interpreter.jumps.get(ip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnmatchedBracketKind;
    use crate::io::{StringInput, StringOutput};
    use std::io;

    fn run_small(code: &str, input: &str) -> (Result<Halted<16>, ExecError>, Vec<u8>) {
        let interp = Interpreter::<16>::with_cells(code).expect("valid script");
        let mut out = StringOutput::new();
        let result = interp.run(StringInput::new(input), &mut out);
        (result, out.as_bytes().to_vec())
    }

    struct FailingOutput;

    impl ByteOutput for FailingOutput {
        fn write_byte(&mut self, _: u8) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }
    }

    struct CountingInput {
        reads: usize,
    }

    impl ByteInput for CountingInput {
        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            self.reads += 1;
            Ok(None)
        }
    }

    #[test]
    fn plus_dot_outputs_one_without_reading() {
        let interp = Interpreter::<4>::with_cells("+.").unwrap();
        let mut input = CountingInput { reads: 0 };
        let mut out = StringOutput::new();
        let halted = interp.run(&mut input, &mut out).unwrap();
        assert_eq!(out.as_bytes(), &[1]);
        assert_eq!(input.reads, 0);
        assert_eq!(halted.steps, 2);
    }

    #[test]
    fn read_then_write_echoes() {
        let (result, out) = run_small(",.", "A");
        assert!(result.is_ok());
        assert_eq!(out, b"A");
    }

    #[test]
    fn countdown_loop_leaves_zero_cell() {
        let (result, out) = run_small("+[-]", "");
        let halted = result.unwrap();
        assert!(out.is_empty());
        assert_eq!(halted.tape.read(), 0);
        assert_eq!(halted.tape.cursor(), 0);
    }

    #[test]
    fn zero_cell_skips_whole_loop_body() {
        let (result, out) = run_small("[.+]+.", "");
        assert!(result.is_ok());
        assert_eq!(out, &[1]);
    }

    #[test]
    fn close_jumps_back_inside_the_loop() {
        // Loop body runs three times: open bracket executes once, close three times.
        let (result, out) = run_small("+++[.-]", "");
        let halted = result.unwrap();
        assert_eq!(out, &[3, 2, 1]);
        // 3 '+' + 1 '[' + 3 * ('.' '-' ']')
        assert_eq!(halted.steps, 3 + 1 + 3 * 3);
    }

    #[test]
    fn nested_loops_multiply() {
        let (result, _) = run_small("++[>+++[>+<-]<-]>>", "");
        let halted = result.unwrap();
        assert_eq!(halted.tape.cursor(), 2);
        assert_eq!(halted.tape.read(), 6);
    }

    #[test]
    fn pointer_wraps_around_the_tape() {
        let (result, _) = run_small("<+", "");
        let halted = result.unwrap();
        assert_eq!(halted.tape.cursor(), 15);
        assert_eq!(halted.tape.cells()[15], 1);
    }

    #[test]
    fn comments_are_skipped_but_counted() {
        let (result, out) = run_small("a+b.", "");
        assert_eq!(result.unwrap().steps, 4);
        assert_eq!(out, &[1]);
    }

    #[test]
    fn exhausted_input_stops_after_partial_output() {
        let (result, out) = run_small(",.,.,.", "xy");
        assert!(matches!(result, Err(ExecError::NoMoreInput { ip: 4 })));
        assert_eq!(out, b"xy");
    }

    #[test]
    fn output_failure_is_an_io_error() {
        let interp = Interpreter::<4>::with_cells("+.").unwrap();
        let result = interp.run(StringInput::new(""), FailingOutput);
        match result {
            Err(ExecError::Io { ip, source }) => {
                assert_eq!(ip, 1);
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("expected I/O error, got {other:?}"),
        }
    }

    #[test]
    fn unbalanced_script_is_rejected_up_front() {
        let err = Interpreter::<4>::with_cells("[").unwrap_err();
        assert_eq!(err, ScriptError::Unbalanced { ip: 0, kind: UnmatchedBracketKind::Open });
        assert!(Interpreter::<4>::with_cells("][").is_err());
    }

    #[test]
    fn scan_and_table_agree() {
        let code = "++++++++[>++++[>++>+++>+++>+<<<<-]>+>+>->>+[<]<-]>>.>---.+++++++..+++.";
        let table = Interpreter::<32>::with_cells(code).unwrap();
        let scan = table.clone().with_strategy(MatchStrategy::Scan);
        assert_eq!(scan.strategy(), MatchStrategy::Scan);

        let mut a = StringOutput::new();
        let mut b = StringOutput::new();
        let ha = table.run(StringInput::new(""), &mut a).unwrap();
        let hb = scan.run(StringInput::new(""), &mut b).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_eq!(a.into_string(), "Hello");
        assert_eq!(ha.steps, hb.steps);
        assert_eq!(ha.tape, hb.tape);
    }

    #[test]
    fn sessions_do_not_share_state() {
        let interp = Interpreter::<4>::with_cells("+>").unwrap();
        let first = interp.run(StringInput::new(""), StringOutput::new()).unwrap();
        let second = interp.run(StringInput::new(""), StringOutput::new()).unwrap();
        assert_eq!(first.tape, second.tape);
        assert_eq!(second.tape.cells(), &[1, 0, 0, 0]);
    }

    #[test]
    fn step_limit_aborts_infinite_loop() {
        let interp = Interpreter::<4>::with_cells("+[]").unwrap();
        let ctrl = StepControl::new(Some(50), Arc::new(AtomicBool::new(false)));
        let result = interp.run_with_control(StringInput::new(""), StringOutput::new(), &ctrl);
        assert!(matches!(result, Err(ExecError::StepLimitExceeded { limit: 50 })));
    }

    #[test]
    fn raised_flag_cancels_before_first_step() {
        let interp = Interpreter::<4>::with_cells("+.").unwrap();
        let ctrl = StepControl::default();
        ctrl.cancel();
        let mut out = StringOutput::new();
        let result = interp.run_with_control(StringInput::new(""), &mut out, &ctrl);
        assert!(matches!(result, Err(ExecError::Canceled)));
        assert!(out.as_bytes().is_empty());
    }

    #[test]
    fn cancel_from_another_thread_stops_infinite_loop() {
        let interp = Interpreter::<4>::with_cells("+[]").unwrap();
        let ctrl = StepControl::default();
        let remote = ctrl.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            remote.cancel();
        });
        let result = interp.run_with_control(StringInput::new(""), StringOutput::new(), &ctrl);
        handle.join().unwrap();
        assert!(matches!(result, Err(ExecError::Canceled)));
    }
}
