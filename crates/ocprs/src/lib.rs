// OCP Runtime
// Compiles rule-based transliteration programs to bytecode and runs them
// against buffered character streams.

#[cfg(test)]
mod test;

pub mod compiler;
pub mod limits;
pub mod ocp_vm;
pub mod program;

#[cfg(feature = "serde")]
pub mod serde;

pub use compiler::{CompileError, CompileErrors, CompileOptions, SyntaxError, SyntaxErrorKind};
pub use compiler::{compile, compile_with_options};
pub use ocp_vm::{
    FaultKind, Instruction, Machine, NoMatchPolicy, Observer, OcpResult, OpCode, Phase,
    RuntimeError, Status, TraceContext, VmOptions, execute, execute_str, execute_with,
};
pub use program::{LoadError, Program, RuleBlock, State, StateId, load};

/// Encode a string as the character codes the VM consumes.
pub fn to_codes(text: &str) -> Vec<u32> {
    text.chars().map(|ch| ch as u32).collect()
}
