// Compiled program container.
// A Program owns every state and pooled table; it is immutable once built
// and can be shared read-only between any number of machines.

pub mod dump;
mod serializer;

pub use serializer::{LoadError, load};
pub(crate) use serializer::validate;

use crate::ocp_vm::opcode::OpFamily;
use crate::{Instruction, OpCode};
use smol_str::SmolStr;

/// Index of a state inside its program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateId(pub u32);

impl StateId {
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for StateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Bytecode for one rule: `match… COMMIT action… (GOTO|STAY)`
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleBlock {
    /// Source line of the rule, 0 when unknown
    pub line: u32,
    pub code: Vec<Instruction>,
}

impl RuleBlock {
    /// Index of the first action instruction
    pub fn action_start(&self) -> Option<usize> {
        self.code
            .iter()
            .position(|i| i.try_opcode() == Some(OpCode::Commit))
            .map(|pc| pc + 1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct State {
    pub name: SmolStr,
    /// Tried in order; the first rule that matches wins
    pub rules: Vec<RuleBlock>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    states: Vec<State>,
    tables: Vec<Vec<u32>>,
    entry: StateId,
}

/// Why a block failed verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockDefect {
    InvalidOpcode(u8),
    Misplaced(OpCode),
    MissingExtraArg(OpCode),
    UnknownState(u32),
    UnknownTable(u32),
    Unterminated,
}

impl std::fmt::Display for BlockDefect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockDefect::InvalidOpcode(byte) => write!(f, "invalid opcode {byte:#04x}"),
            BlockDefect::Misplaced(op) => write!(f, "{op} out of place"),
            BlockDefect::MissingExtraArg(op) => write!(f, "{op} without EXTRAARG"),
            BlockDefect::UnknownState(id) => write!(f, "transition to unknown state {id}"),
            BlockDefect::UnknownTable(id) => write!(f, "lookup in unknown table {id}"),
            BlockDefect::Unterminated => f.write_str("block does not end in a transition"),
        }
    }
}

impl Program {
    /// Assemble a program from parts produced by code generation
    pub(crate) fn from_parts(states: Vec<State>, tables: Vec<Vec<u32>>, entry: StateId) -> Self {
        Program {
            states,
            tables,
            entry,
        }
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id.index())
    }

    /// Name of a state, `"?"` for an id outside the program
    pub fn state_name(&self, id: StateId) -> &str {
        self.state(id).map_or("?", |state| state.name.as_str())
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .position(|state| state.name == name)
            .map(|index| StateId(index as u32))
    }

    pub fn tables(&self) -> &[Vec<u32>] {
        &self.tables
    }

    pub fn entry(&self) -> StateId {
        self.entry
    }

    pub fn rule_count(&self) -> usize {
        self.states.iter().map(|state| state.rules.len()).sum()
    }

    pub fn instruction_count(&self) -> usize {
        self.states
            .iter()
            .flat_map(|state| state.rules.iter())
            .map(|rule| rule.code.len())
            .sum()
    }

    /// Serialize to the binary container read by [`load`]
    pub fn serialize(&self) -> Vec<u8> {
        serializer::serialize_program(self)
    }

    /// Check every block's structure and every state/table reference
    pub(crate) fn verify(&self) -> Result<(), (usize, usize, BlockDefect)> {
        if self.entry.index() >= self.states.len() {
            return Err((0, 0, BlockDefect::UnknownState(self.entry.0)));
        }
        for (state_index, state) in self.states.iter().enumerate() {
            for (rule_index, rule) in state.rules.iter().enumerate() {
                verify_block(&rule.code, self.states.len(), self.tables.len())
                    .map_err(|defect| (state_index, rule_index, defect))?;
            }
        }
        Ok(())
    }
}

fn verify_block(code: &[Instruction], states: usize, tables: usize) -> Result<(), BlockDefect> {
    let mut in_actions = false;
    let mut pc = 0;
    while pc < code.len() {
        let instruction = code[pc];
        let op = instruction
            .try_opcode()
            .ok_or(BlockDefect::InvalidOpcode(instruction.opcode_byte()))?;

        match (op.family(), in_actions) {
            (OpFamily::Arith, _) => {}
            (OpFamily::Match, false) => {
                if op == OpCode::Commit {
                    in_actions = true;
                }
            }
            (OpFamily::Advance | OpFamily::Requeue, true) => {}
            (OpFamily::Transition, true) => {
                if pc + 1 != code.len() {
                    return Err(BlockDefect::Misplaced(op));
                }
            }
            _ => return Err(BlockDefect::Misplaced(op)),
        }

        match op {
            OpCode::Goto if instruction.arg() as usize >= states => {
                return Err(BlockDefect::UnknownState(instruction.arg()));
            }
            OpCode::Lookup if instruction.arg() as usize >= tables => {
                return Err(BlockDefect::UnknownTable(instruction.arg()));
            }
            _ => {}
        }

        if op.takes_extra_arg() {
            if code.get(pc + 1).and_then(|i| i.try_opcode()) != Some(OpCode::ExtraArg) {
                return Err(BlockDefect::MissingExtraArg(op));
            }
            pc += 1;
        }
        pc += 1;
    }

    let terminated = code
        .last()
        .and_then(|i| i.try_opcode())
        .is_some_and(|op| op.family() == OpFamily::Transition);
    if in_actions && terminated {
        Ok(())
    } else {
        Err(BlockDefect::Unterminated)
    }
}
