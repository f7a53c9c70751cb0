// Rule/state lowering
use super::program;
use crate::*;
use pretty_assertions::assert_eq;

fn block(program: &Program, state: usize, rule: usize) -> Vec<Instruction> {
    program.states()[state].rules[rule].code.clone()
}

#[test]
fn test_rule_block_layout() {
    let program = program(r#"state S: "a" \(*+1-2) -> \1 \(*+1) <- \$ => S;"#);
    assert_eq!(
        block(&program, 0, 0),
        vec![
            Instruction::new(OpCode::MatchChar, 97),
            Instruction::new(OpCode::MatchSome, 1),
            Instruction::new(OpCode::ExtraArg, 2),
            Instruction::new(OpCode::Commit, 0),
            Instruction::new(OpCode::OutChar, 1),
            Instruction::new(OpCode::OutSome, 1),
            Instruction::new(OpCode::ExtraArg, 0),
            Instruction::new(OpCode::PbackLast, 0),
            Instruction::new(OpCode::Goto, 0),
        ]
    );
    assert_eq!(program.states()[0].rules[0].action_start(), Some(4));
}

#[test]
fn test_arithmetic_lowers_to_postfix() {
    let program = program(r"state S: \* -> #(\1 + 2 * 3);");
    assert_eq!(
        block(&program, 0, 0),
        vec![
            Instruction::new(OpCode::MatchSome, 0),
            Instruction::new(OpCode::ExtraArg, 0),
            Instruction::new(OpCode::Commit, 0),
            Instruction::new(OpCode::PushChar, 1),
            Instruction::new(OpCode::PushNum, 2),
            Instruction::new(OpCode::PushNum, 3),
            Instruction::new(OpCode::Mul, 0),
            Instruction::new(OpCode::Add, 0),
            Instruction::new(OpCode::OutValue, 0),
            Instruction::new(OpCode::Stay, 0),
        ]
    );
}

#[test]
fn test_push_back_selects_requeue_variants() {
    let program = program(r#"state S: \* -> <- "x" \1 \$ \* #5;"#);
    let ops: Vec<OpCode> = block(&program, 0, 0)
        .into_iter()
        .map(|i| i.opcode())
        .filter(|op| op.family() == ocp_vm::opcode::OpFamily::Requeue)
        .collect();
    assert_eq!(
        ops,
        vec![
            OpCode::PbackNum,
            OpCode::PbackChar,
            OpCode::PbackLast,
            OpCode::PbackSome,
            OpCode::PbackValue,
        ]
    );
}

#[test]
fn test_forward_state_reference() {
    let program = program(r#"state A: "a" -> "1" => B; state B: "a" -> "2" => A;"#);
    assert_eq!(program.entry(), StateId(0));
    assert_eq!(program.state_id("B"), Some(StateId(1)));
    assert_eq!(block(&program, 0, 0).last(), Some(&Instruction::new(OpCode::Goto, 1)));
    assert_eq!(execute_str(&program, "aaa").unwrap(), "121");
}

#[test]
fn test_first_declared_state_is_entry() {
    let program = program(r#"state Z: "a" -> "z"; state A: "a" -> "a";"#);
    assert_eq!(program.state_name(program.entry()), "Z");
}

#[test]
fn test_implicit_state() {
    let program = program(r#""a" -> "b";"#);
    assert_eq!(program.states()[0].name, limits::IMPLICIT_STATE);
    assert_eq!(execute_str(&program, "aa").unwrap(), "bb");
}

#[test]
fn test_operand_overflow_at_default_width() {
    // 0x1000000 needs 25 bits
    let errors = compile(r#"state S: "a" -> @"1000000;"#).unwrap_err();
    assert_eq!(
        errors.first(),
        &CompileError::OperandOverflow {
            state: "S".into(),
            rule: 0,
            value: 0x100_0000,
            limit: Instruction::MAX_ARG,
        }
    );

    assert!(compile(r#"state S: "a" -> @"FFFFFF;"#).is_ok());
}

#[test]
fn test_operand_overflow_with_narrow_limit() {
    let options = CompileOptions { max_operand: 255 };
    let errors = compile_with_options("state S: 97 -> 300;\n \"b\" -> 255;", &options).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors.first(),
        &CompileError::OperandOverflow {
            state: "S".into(),
            rule: 0,
            value: 300,
            limit: 255,
        }
    );
    assert_eq!(CompileOptions { max_operand: u32::MAX }.operand_limit(), Instruction::MAX_ARG);
}

#[test]
fn test_semantic_errors_are_collected() {
    let errors = compile(
        r#"
        table T = {1};
        table T = {2};
        state S: "a" -> "b" => Nowhere;
                 "b" -> #U[0];
                 \(*+3-1) -> "c";
        state S: "c" -> "d";
        "#,
    )
    .unwrap_err();

    assert_eq!(
        errors.errors(),
        &[
            CompileError::DuplicateState {
                name: "S".into(),
                line: 7,
            },
            CompileError::DuplicateTable {
                name: "T".into(),
                line: 3,
            },
            CompileError::UndeclaredState {
                state: "S".into(),
                rule: 0,
                name: "Nowhere".into(),
            },
            CompileError::UndeclaredTable {
                state: "S".into(),
                rule: 1,
                name: "U".into(),
            },
            CompileError::EmptyRange {
                state: "S".into(),
                rule: 2,
                min: 3,
                max: 1,
            },
        ]
    );
}

#[test]
fn test_no_states() {
    assert_eq!(compile("").unwrap_err().first(), &CompileError::NoStates);
    assert_eq!(
        compile("table T = {1};").unwrap_err().first(),
        &CompileError::NoStates
    );
}

#[test]
fn test_tables_are_pooled() {
    let program = program(
        r"
        table A = {1, 2};
        table B = {1, 2};
        table C = {3};
        state S: \* -> #A[0] #B[1] #C[0];
        ",
    );
    assert_eq!(program.tables(), &[vec![1, 2], vec![3]]);
    let lookups: Vec<u32> = block(&program, 0, 0)
        .into_iter()
        .filter(|i| i.opcode() == OpCode::Lookup)
        .map(|i| i.arg())
        .collect();
    assert_eq!(lookups, vec![0, 0, 1]);
}

#[test]
fn test_rule_lines_are_recorded() {
    let program = program("state S:\n  \"a\" -> \"b\";\n\n  \"c\" -> \"d\";");
    let lines: Vec<u32> = program.states()[0].rules.iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![2, 4]);
    assert_eq!(program.rule_count(), 2);
    assert_eq!(program.instruction_count(), 8);
}
