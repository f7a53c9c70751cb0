// Test module organization
pub mod test_codegen;
pub mod test_observer;
pub mod test_parser;
pub mod test_serializer;

use crate::*;

/// Compile or fail the test with the compiler's message
pub(crate) fn program(source: &str) -> Program {
    match compile(source) {
        Ok(program) => program,
        Err(errors) => panic!("compile failed:\n{errors}"),
    }
}

pub(crate) fn run(source: &str, input: &str) -> Result<String, RuntimeError> {
    execute_str(&program(source), input)
}
