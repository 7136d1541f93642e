use std::fmt;

/// One of the eight tape-machine instructions.
///
/// Characters outside this set are comments: they keep their place in the
/// script (so error positions match the source) but do nothing when run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `+`
    Increment,
    /// `-`
    Decrement,
    /// `>`
    MoveRight,
    /// `<`
    MoveLeft,
    /// `[`
    LoopOpen,
    /// `]`
    LoopClose,
    /// `.`
    Output,
    /// `,`
    Input,
}

impl Instruction {
    pub fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '+' => Instruction::Increment,
            '-' => Instruction::Decrement,
            '>' => Instruction::MoveRight,
            '<' => Instruction::MoveLeft,
            '[' => Instruction::LoopOpen,
            ']' => Instruction::LoopClose,
            '.' => Instruction::Output,
            ',' => Instruction::Input,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Instruction::Increment => '+',
            Instruction::Decrement => '-',
            Instruction::MoveRight => '>',
            Instruction::MoveLeft => '<',
            Instruction::LoopOpen => '[',
            Instruction::LoopClose => ']',
            Instruction::Output => '.',
            Instruction::Input => ',',
        }
    }

    /// True for either loop bound.
    pub fn is_bound(self) -> bool {
        matches!(self, Instruction::LoopOpen | Instruction::LoopClose)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
