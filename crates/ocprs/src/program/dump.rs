// Program disassembly
// Plain-text listing of every state, rule block, and pooled table

use super::{Program, StateId};
use crate::{Instruction, OpCode};

/// Full listing of a program
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();
    let mut num = itoa::Buffer::new();

    out.push_str("entry ");
    out.push_str(program.state_name(program.entry()));
    out.push('\n');

    for (index, table) in program.tables().iter().enumerate() {
        out.push_str("table ");
        out.push_str(num.format(index));
        out.push_str(" = {");
        for (i, value) in table.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            out.push_str(num.format(*value));
        }
        out.push_str("}\n");
    }

    for (state_index, state) in program.states().iter().enumerate() {
        out.push_str("\nstate ");
        out.push_str(num.format(state_index));
        out.push(' ');
        out.push_str(&state.name);
        out.push_str(" (");
        out.push_str(num.format(state.rules.len()));
        out.push_str(if state.rules.len() == 1 { " rule)\n" } else { " rules)\n" });

        for (rule_index, rule) in state.rules.iter().enumerate() {
            out.push_str("  rule ");
            out.push_str(num.format(rule_index));
            if rule.line > 0 {
                out.push_str(" (line ");
                out.push_str(num.format(rule.line));
                out.push(')');
            }
            out.push('\n');

            for (pc, &instruction) in rule.code.iter().enumerate() {
                out.push_str(&format!("  {:4}  ", pc));
                out.push_str(&format_instruction(program, instruction));
                out.push('\n');
            }
        }
    }
    out
}

/// One instruction with its operand resolved where that helps:
/// character codes shown as characters, state and table ids by name or size.
pub fn format_instruction(program: &Program, instruction: Instruction) -> String {
    let Some(op) = instruction.try_opcode() else {
        return instruction.to_string();
    };
    let arg = instruction.arg();
    let mut text = String::from(op.name());

    match op {
        OpCode::Commit | OpCode::Stay | OpCode::MatchValue | OpCode::OutValue
        | OpCode::PbackValue | OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {}
        _ => {
            text.push(' ');
            text.push_str(itoa::Buffer::new().format(arg));
        }
    }

    match op {
        OpCode::MatchChar | OpCode::OutNum | OpCode::PbackNum => {
            if let Some(ch) = char::from_u32(arg).filter(|ch| !ch.is_control()) {
                text.push_str(&format!("  ; {ch:?}"));
            }
        }
        OpCode::Goto => {
            text.push_str("  ; ");
            text.push_str(program.state_name(StateId(arg)));
        }
        OpCode::Lookup => {
            let len = program.tables().get(arg as usize).map_or(0, Vec::len);
            text.push_str(&format!("  ; {len} entries"));
        }
        _ => {}
    }
    text
}
