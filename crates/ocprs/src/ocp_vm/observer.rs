// Execution observer
// Optional hook the machine calls before each rule attempt and each
// instruction. With no observer attached the machine never builds a context.

use crate::program::{Program, StateId};
use crate::Instruction;

/// Which half of a rule block is executing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Match,
    Action,
}

/// Read-only view of the machine handed to an [`Observer`]
#[derive(Debug, Clone, Copy)]
pub struct TraceContext<'a> {
    pub program: &'a Program,
    pub state: StateId,
    /// Index of the rule being tried within its state
    pub rule: usize,
    pub pc: usize,
    pub phase: Phase,
    /// Characters consumed before the current rule attempt
    pub position: usize,
    /// Pending input, starting where the current match starts
    pub input: &'a [u32],
    /// Length of the match so far
    pub matched: usize,
    /// Output committed by earlier rules
    pub output: &'a [u32],
    /// Output the current rule has produced but not yet committed
    pub emitted: &'a [u32],
    pub stack: &'a [i64],
}

impl<'a> TraceContext<'a> {
    pub fn state_name(&self) -> &'a str {
        self.program.state_name(self.state)
    }

    pub fn matched_input(&self) -> &'a [u32] {
        &self.input[..self.matched.min(self.input.len())]
    }
}

/// Returning `false` from either callback stops the machine before the
/// current rule takes effect.
pub trait Observer {
    fn on_rule(&mut self, ctx: &TraceContext<'_>) -> bool {
        let _ = ctx;
        true
    }

    fn on_instruction(&mut self, ctx: &TraceContext<'_>, instruction: Instruction) -> bool;
}

impl<F> Observer for F
where
    F: FnMut(&TraceContext<'_>, Instruction) -> bool,
{
    fn on_instruction(&mut self, ctx: &TraceContext<'_>, instruction: Instruction) -> bool {
        self(ctx, instruction)
    }
}
