// OCP Virtual Machine
// Executes compiled rule blocks against a buffered character stream
mod execute;
mod input_window;
mod machine;
mod observer;
mod ocp_error;
pub mod opcode;
mod vm_option;

pub use machine::{Machine, Status};
pub use observer::{Observer, Phase, TraceContext};
pub use ocp_error::{FaultKind, OcpResult, RuntimeError};
pub use opcode::{Instruction, OpCode};
pub use vm_option::{NoMatchPolicy, VmOptions};

use crate::program::Program;

/// Run a program over complete input with default options
pub fn execute(program: &Program, input: &[u32]) -> OcpResult<Vec<u32>> {
    execute_with(program, input, VmOptions::default())
}

pub fn execute_with(program: &Program, input: &[u32], options: VmOptions) -> OcpResult<Vec<u32>> {
    let mut machine = Machine::with_options(program, options);
    machine.feed(input);
    machine.finish();
    machine.run()?;
    Ok(machine.take_output())
}

/// Run a program over text and decode the output as text
pub fn execute_str(program: &Program, text: &str) -> OcpResult<String> {
    let mut machine = Machine::new(program);
    machine.feed_str(text);
    machine.finish();
    machine.run()?;
    machine.take_output_string()
}
