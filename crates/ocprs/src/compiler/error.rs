use smol_str::SmolStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxErrorKind {
    UnterminatedString,
    /// End of input inside `\(`…`)` or right after `\`
    UnterminatedReference,
    MalformedReference,
    UnexpectedEof,
    ExpectedNumber,
    Expected(&'static str),
    NumberTooLarge,
    NestingTooDeep,
}

impl std::fmt::Display for SyntaxErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyntaxErrorKind::UnterminatedString => f.write_str("unterminated string"),
            SyntaxErrorKind::UnterminatedReference => f.write_str("unterminated reference"),
            SyntaxErrorKind::MalformedReference => f.write_str("malformed reference"),
            SyntaxErrorKind::UnexpectedEof => f.write_str("unexpected end of input"),
            SyntaxErrorKind::ExpectedNumber => f.write_str("number expected"),
            SyntaxErrorKind::Expected(what) => write!(f, "{what} expected"),
            SyntaxErrorKind::NumberTooLarge => f.write_str("number too large"),
            SyntaxErrorKind::NestingTooDeep => f.write_str("arithmetic nested too deeply"),
        }
    }
}

/// Syntax fault with the offending character and its position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {kind}{}", found_suffix(.found))]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    /// `None` at end of input
    pub found: Option<char>,
    pub line: u32,
    pub column: u32,
}

fn found_suffix(found: &Option<char>) -> String {
    match found {
        Some(ch) => format!(" near '{}'", ch.escape_default()),
        None => " at end of input".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("state `{state}`, rule {rule}: operand {value} exceeds the limit of {limit}")]
    OperandOverflow {
        state: SmolStr,
        rule: usize,
        value: u64,
        limit: u32,
    },
    #[error("state `{state}`, rule {rule}: run bounds {min}..{max} are empty")]
    EmptyRange {
        state: SmolStr,
        rule: usize,
        min: u32,
        max: u32,
    },
    #[error("state `{state}`, rule {rule}: undeclared state `{name}`")]
    UndeclaredState {
        state: SmolStr,
        rule: usize,
        name: SmolStr,
    },
    #[error("state `{state}`, rule {rule}: undeclared table `{name}`")]
    UndeclaredTable {
        state: SmolStr,
        rule: usize,
        name: SmolStr,
    },
    #[error("line {line}: state `{name}` declared twice")]
    DuplicateState { name: SmolStr, line: u32 },
    #[error("line {line}: table `{name}` declared twice")]
    DuplicateTable { name: SmolStr, line: u32 },
    #[error("no state declared")]
    NoStates,
}

/// Every fault found in one compilation; never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileErrors(Vec<CompileError>);

impl CompileErrors {
    pub(crate) fn new(errors: Vec<CompileError>) -> Self {
        debug_assert!(!errors.is_empty());
        CompileErrors(errors)
    }

    pub fn errors(&self) -> &[CompileError] {
        &self.0
    }

    pub fn first(&self) -> &CompileError {
        &self.0[0]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompileErrors {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.first())
    }
}

impl From<Vec<SyntaxError>> for CompileErrors {
    fn from(errors: Vec<SyntaxError>) -> Self {
        CompileErrors::new(errors.into_iter().map(CompileError::Syntax).collect())
    }
}
