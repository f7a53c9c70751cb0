use smol_str::SmolStr;
use thiserror::Error;

/// What went wrong during execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// No rule of the current state matches and the policy is `Fault`
    NoMatchingRule,
    /// A rule needed more characters than were left at end of input
    UnterminatedMatch,
    DivisionByZero,
    ArithmeticOverflow,
    TableIndexOutOfBounds { table: u32, index: i64 },
    /// Back-reference outside the characters matched so far
    ReferenceOutOfRange { index: u32, matched: usize },
    /// Emitted or requeued value is not a character code
    CodeOutOfRange(i64),
    /// Output code is not a Unicode scalar value
    InvalidCharacter(u32),
    StackUnderflow,
    StepLimit(u64),
    /// Block structure the verifier should have rejected
    InvalidProgram,
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultKind::NoMatchingRule => f.write_str("no matching rule"),
            FaultKind::UnterminatedMatch => f.write_str("unterminated match at end of input"),
            FaultKind::DivisionByZero => f.write_str("division by zero"),
            FaultKind::ArithmeticOverflow => f.write_str("arithmetic overflow"),
            FaultKind::TableIndexOutOfBounds { table, index } => {
                write!(f, "index {index} out of bounds for table {table}")
            }
            FaultKind::ReferenceOutOfRange { index, matched } => {
                write!(f, "reference {index} outside the {matched} matched characters")
            }
            FaultKind::CodeOutOfRange(value) => write!(f, "value {value} is not a character code"),
            FaultKind::InvalidCharacter(code) => write!(f, "code {code:#x} is not a character"),
            FaultKind::StackUnderflow => f.write_str("arithmetic stack underflow"),
            FaultKind::StepLimit(limit) => write!(f, "step limit of {limit} exceeded"),
            FaultKind::InvalidProgram => f.write_str("invalid program"),
        }
    }
}

/// Run-time fault with the state and input position it happened at
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in state `{state}` at input position {position}")]
pub struct RuntimeError {
    pub kind: FaultKind,
    pub state: SmolStr,
    /// Characters consumed before the fault
    pub position: usize,
    /// Rule that was executing, if the fault happened inside one
    pub rule: Option<usize>,
}

pub type OcpResult<T> = Result<T, RuntimeError>;
