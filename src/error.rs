use std::fmt;

/// Which side of a loop was left without a partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// A script rejected before execution. Nothing has been read or written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    #[error("Unbalanced script: unmatched bracket {kind} at instruction {ip}")]
    Unbalanced { ip: usize, kind: UnmatchedBracketKind },
}

impl ScriptError {
    pub fn ip(&self) -> usize {
        match self {
            ScriptError::Unbalanced { ip, .. } => *ip,
        }
    }
}

/// A broken engine guarantee. Seeing one of these means the validator and
/// the loop resolver disagree, which is a bug in this crate, not in the script.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("loop resolver called at instruction {ip}, which is not a loop bound")]
    NotOnBound { ip: usize },

    #[error("loop resolver ran off the script looking for the partner of instruction {ip}")]
    RanOffEnd { ip: usize },
}

impl InvariantViolation {
    pub fn ip(&self) -> usize {
        match self {
            InvariantViolation::NotOnBound { ip } | InvariantViolation::RanOffEnd { ip } => *ip,
        }
    }
}

/// Errors that stop a running session.
///
/// Output written before the error stays written.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// An input instruction found the input source exhausted.
    #[error("No more input at instruction {ip}")]
    NoMoreInput { ip: usize },

    /// The input or output transport failed.
    #[error("I/O error at instruction {ip}: {source}")]
    Io {
        ip: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal invariant violated: {0}")]
    Internal(#[from] InvariantViolation),

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g., timeout).
    #[error("Execution aborted: cancelled")]
    Canceled,
}

impl ExecError {
    /// Instruction index the error is tied to, when there is one.
    pub fn ip(&self) -> Option<usize> {
        match self {
            ExecError::NoMoreInput { ip } | ExecError::Io { ip, .. } => Some(*ip),
            ExecError::Internal(violation) => Some(violation.ip()),
            ExecError::StepLimitExceeded { .. } | ExecError::Canceled => None,
        }
    }
}

/// Error returned by the one-shot entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Script(#[from] ScriptError),

    #[error(transparent)]
    Exec(#[from] ExecError),
}
