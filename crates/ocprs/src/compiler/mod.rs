// Transliteration compiler - Main module
// Parses rule source text and lowers it to a bytecode Program
pub mod ast;
mod codegen;
mod error;
pub mod parser;

pub use error::{CompileError, CompileErrors, SyntaxError, SyntaxErrorKind};

use crate::Instruction;
use crate::program::Program;
use ast::SourceUnit;
use codegen::CodeGen;
use parser::OcpParser;

/// Compiler configuration
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// Largest operand a rule may carry. Values above the encoding's
    /// `Instruction::MAX_ARG` are clamped to it; lower values reproduce the
    /// overflow threshold of narrower historical formats.
    pub max_operand: u32,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_operand: Instruction::MAX_ARG,
        }
    }
}

impl CompileOptions {
    pub fn operand_limit(&self) -> u32 {
        self.max_operand.min(Instruction::MAX_ARG)
    }
}

/// Parse source text without generating code
pub fn parse(source: &str) -> Result<SourceUnit, CompileErrors> {
    OcpParser::new(source).parse_unit().map_err(CompileErrors::from)
}

/// Compile source text to a Program with default options
pub fn compile(source: &str) -> Result<Program, CompileErrors> {
    compile_with_options(source, &CompileOptions::default())
}

pub fn compile_with_options(
    source: &str,
    options: &CompileOptions,
) -> Result<Program, CompileErrors> {
    let unit = parse(source)?;
    let program = CodeGen::new(options)
        .generate(&unit)
        .map_err(CompileErrors::new)?;
    log::debug!(
        "compiled {} states, {} rules, {} instructions",
        program.states().len(),
        program.rule_count(),
        program.instruction_count()
    );
    Ok(program)
}
