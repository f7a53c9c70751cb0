/*----------------------------------------------------------------------
  Rule execution

  One `RuleExecutor` runs one rule block against the pending input:
  1. Match phase: instructions up to COMMIT decide whether the rule
     applies and how many characters it consumes.
  2. Action phase: instructions after COMMIT fill the scratch buffers
     with emitted and requeued values, ending at GOTO or STAY.

  The executor never touches the machine. Output and requeued values
  stay in `Scratch` until the caller commits them, so a fault or an
  observer stop in the middle of a rule leaves no trace.
----------------------------------------------------------------------*/

mod action;
mod arith;
mod pattern;

use crate::ocp_vm::{FaultKind, Instruction, Observer, Phase, TraceContext};
use crate::program::{Program, StateId};
pub(crate) use pattern::ChoicePoint;

/// Rule that matched and ran its actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Applied {
    pub consumed: usize,
    /// `None` for STAY
    pub next: Option<StateId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RuleOutcome {
    Applied(Applied),
    /// `hit_end` is set when some attempt ran into the end of input
    Failed { hit_end: bool },
    /// The rule needs input that has not been fed yet
    Starved,
    Stopped,
}

/// Per-machine buffers reused by every rule attempt
#[derive(Debug, Default)]
pub(crate) struct Scratch {
    pub stack: Vec<i64>,
    pub emitted: Vec<u32>,
    pub requeued: Vec<u32>,
    pub choices: Vec<ChoicePoint>,
}

impl Scratch {
    pub fn clear(&mut self) {
        self.stack.clear();
        self.emitted.clear();
        self.requeued.clear();
        self.choices.clear();
    }
}

pub(crate) struct RuleExecutor<'a, 'p> {
    pub program: &'a Program,
    pub state: StateId,
    pub rule: usize,
    pub code: &'a [Instruction],
    pub input: &'a [u32],
    pub finished: bool,
    pub position: usize,
    pub output: &'a [u32],
    pub scratch: &'a mut Scratch,
    pub observer: Option<&'a mut (dyn Observer + 'p)>,
}

impl RuleExecutor<'_, '_> {
    pub fn run(mut self) -> Result<RuleOutcome, FaultKind> {
        self.scratch.clear();
        if !self.notify_rule() {
            return Ok(RuleOutcome::Stopped);
        }
        match self.match_pattern()? {
            pattern::PatternOutcome::Matched { len, commit } => self.run_actions(commit + 1, len),
            pattern::PatternOutcome::Failed { hit_end } => Ok(RuleOutcome::Failed { hit_end }),
            pattern::PatternOutcome::Starved => Ok(RuleOutcome::Starved),
            pattern::PatternOutcome::Stopped => Ok(RuleOutcome::Stopped),
        }
    }

    fn notify_rule(&mut self) -> bool {
        let Some(observer) = self.observer.as_deref_mut() else {
            return true;
        };
        let ctx = TraceContext {
            program: self.program,
            state: self.state,
            rule: self.rule,
            pc: 0,
            phase: Phase::Match,
            position: self.position,
            input: self.input,
            matched: 0,
            output: self.output,
            emitted: &self.scratch.emitted,
            stack: &self.scratch.stack,
        };
        observer.on_rule(&ctx)
    }

    #[inline(always)]
    fn notify(&mut self, pc: usize, phase: Phase, matched: usize, instruction: Instruction) -> bool {
        let Some(observer) = self.observer.as_deref_mut() else {
            return true;
        };
        let ctx = TraceContext {
            program: self.program,
            state: self.state,
            rule: self.rule,
            pc,
            phase,
            position: self.position,
            input: self.input,
            matched,
            output: self.output,
            emitted: &self.scratch.emitted,
            stack: &self.scratch.stack,
        };
        observer.on_instruction(&ctx, instruction)
    }

    /// Operand of the EXTRAARG following `pc`
    fn extra_arg(&self, pc: usize) -> Result<u32, FaultKind> {
        match self.code.get(pc + 1) {
            Some(next) if next.try_opcode() == Some(crate::OpCode::ExtraArg) => Ok(next.arg()),
            _ => Err(FaultKind::InvalidProgram),
        }
    }

    /// `matched[index]`, 1-based
    fn char_ref(&self, len: usize, index: u32) -> Result<u32, FaultKind> {
        let i = index as usize;
        if i == 0 || i > len {
            return Err(FaultKind::ReferenceOutOfRange {
                index,
                matched: len,
            });
        }
        Ok(self.input[i - 1])
    }

    /// `matched[len - 1 - offset]`
    fn last_char(&self, len: usize, offset: u32) -> Result<u32, FaultKind> {
        let k = offset as usize;
        if k >= len {
            return Err(FaultKind::ReferenceOutOfRange {
                index: offset,
                matched: len,
            });
        }
        Ok(self.input[len - 1 - k])
    }
}
