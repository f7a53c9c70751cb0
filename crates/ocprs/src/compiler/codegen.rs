// Code generation
// Lowers a parsed unit to per-rule instruction blocks in two passes:
// symbols first (states and tables get their ids), then code.

use super::CompileOptions;
use super::ast::{Action, ArithExpr, ArithOp, Expression, Rule, SourceUnit};
use super::error::CompileError;
use crate::program::{Program, RuleBlock, State, StateId};
use crate::{Instruction, OpCode};
use ahash::AHashMap;
use smol_str::SmolStr;

pub(crate) struct CodeGen<'a> {
    options: &'a CompileOptions,
    state_ids: AHashMap<SmolStr, StateId>,
    table_ids: AHashMap<SmolStr, u32>,
    /// Pool of distinct table contents
    tables: Vec<Vec<u32>>,
    errors: Vec<CompileError>,
}

/// Block under construction for one rule
struct BlockBuilder<'a> {
    code: Vec<Instruction>,
    state: &'a SmolStr,
    rule: usize,
    limit: u32,
}

impl BlockBuilder<'_> {
    fn emit(&mut self, op: OpCode, arg: u64) -> Result<(), CompileError> {
        if arg > self.limit as u64 {
            return Err(CompileError::OperandOverflow {
                state: self.state.clone(),
                rule: self.rule,
                value: arg,
                limit: self.limit,
            });
        }
        self.code.push(Instruction::new(op, arg as u32));
        Ok(())
    }

    fn emit_pair(&mut self, op: OpCode, first: u32, second: u32) -> Result<(), CompileError> {
        self.emit(op, first as u64)?;
        self.emit(OpCode::ExtraArg, second as u64)
    }
}

impl<'a> CodeGen<'a> {
    pub fn new(options: &'a CompileOptions) -> Self {
        CodeGen {
            options,
            state_ids: AHashMap::new(),
            table_ids: AHashMap::new(),
            tables: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn generate(mut self, unit: &SourceUnit) -> Result<Program, Vec<CompileError>> {
        self.collect_symbols(unit);

        let mut states = Vec::with_capacity(unit.states.len());
        for decl in &unit.states {
            log::debug!("lowering state `{}` ({} rules)", decl.name, decl.rules.len());
            let mut rules = Vec::with_capacity(decl.rules.len());
            for (index, rule) in decl.rules.iter().enumerate() {
                match self.lower_rule(&decl.name, index, rule) {
                    Ok(block) => rules.push(block),
                    Err(err) => self.errors.push(err),
                }
            }
            states.push(State {
                name: decl.name.clone(),
                rules,
            });
        }

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        let program = Program::from_parts(states, self.tables, StateId(0));
        debug_assert!(program.verify().is_ok());
        Ok(program)
    }

    /// Pass 1: give every state and table its id before any code exists,
    /// so rules may name states declared further down.
    fn collect_symbols(&mut self, unit: &SourceUnit) {
        if unit.states.is_empty() {
            self.errors.push(CompileError::NoStates);
        }

        for decl in &unit.states {
            let id = StateId(self.state_ids.len() as u32);
            if self.state_ids.contains_key(&decl.name) {
                self.errors.push(CompileError::DuplicateState {
                    name: decl.name.clone(),
                    line: decl.line,
                });
                continue;
            }
            self.state_ids.insert(decl.name.clone(), id);
        }

        let mut pooled: AHashMap<&[u32], u32> = AHashMap::new();
        for decl in &unit.tables {
            if self.table_ids.contains_key(&decl.name) {
                self.errors.push(CompileError::DuplicateTable {
                    name: decl.name.clone(),
                    line: decl.line,
                });
                continue;
            }
            let index = *pooled.entry(decl.values.as_slice()).or_insert_with(|| {
                self.tables.push(decl.values.clone());
                (self.tables.len() - 1) as u32
            });
            self.table_ids.insert(decl.name.clone(), index);
        }
    }

    /// Pass 2: `match… COMMIT action… (GOTO|STAY)`
    fn lower_rule(
        &self,
        state: &SmolStr,
        index: usize,
        rule: &Rule,
    ) -> Result<RuleBlock, CompileError> {
        log::trace!("state `{state}` rule {index} (line {})", rule.line);
        let mut block = BlockBuilder {
            code: Vec::new(),
            state,
            rule: index,
            limit: self.options.operand_limit(),
        };

        for expr in &rule.pattern {
            self.lower_pattern_item(&mut block, expr)?;
        }
        block.emit(OpCode::Commit, 0)?;

        for action in &rule.actions {
            self.lower_action(&mut block, action)?;
        }

        match &rule.next_state {
            Some(name) => {
                let target = self.state_ids.get(name).copied().ok_or_else(|| {
                    CompileError::UndeclaredState {
                        state: state.clone(),
                        rule: index,
                        name: name.clone(),
                    }
                })?;
                block.emit(OpCode::Goto, target.0 as u64)?;
            }
            None => block.emit(OpCode::Stay, 0)?,
        }

        Ok(RuleBlock {
            line: rule.line,
            code: block.code,
        })
    }

    fn lower_pattern_item(
        &self,
        block: &mut BlockBuilder,
        expr: &Expression,
    ) -> Result<(), CompileError> {
        match expr {
            Expression::Constant(code) => block.emit(OpCode::MatchChar, *code as u64),
            Expression::CharRef(index) => block.emit(OpCode::MatchRef, *index as u64),
            Expression::LastChar(offset) => block.emit(OpCode::MatchLast, *offset as u64),
            Expression::Some { min, max } => {
                if *max != 0 && max < min {
                    return Err(CompileError::EmptyRange {
                        state: block.state.clone(),
                        rule: block.rule,
                        min: *min,
                        max: *max,
                    });
                }
                block.emit_pair(OpCode::MatchSome, *min, *max)
            }
            Expression::Arith(arith) => {
                self.lower_arith(block, arith)?;
                block.emit(OpCode::MatchValue, 0)
            }
        }
    }

    fn lower_action(&self, block: &mut BlockBuilder, action: &Action) -> Result<(), CompileError> {
        let variant = |op: OpCode| {
            if action.push_back {
                op.requeue_variant()
            } else {
                op
            }
        };

        match &action.expr {
            Expression::Constant(code) => block.emit(variant(OpCode::OutNum), *code as u64),
            Expression::CharRef(index) => block.emit(variant(OpCode::OutChar), *index as u64),
            Expression::LastChar(offset) => block.emit(variant(OpCode::OutLast), *offset as u64),
            Expression::Some { min, max } => block.emit_pair(variant(OpCode::OutSome), *min, *max),
            Expression::Arith(arith) => {
                self.lower_arith(block, arith)?;
                block.emit(variant(OpCode::OutValue), 0)
            }
        }
    }

    /// Postfix order: operands first, operator last
    fn lower_arith(&self, block: &mut BlockBuilder, expr: &ArithExpr) -> Result<(), CompileError> {
        match expr {
            ArithExpr::Num(value) => block.emit(OpCode::PushNum, *value as u64),
            ArithExpr::CharRef(index) => block.emit(OpCode::PushChar, *index as u64),
            ArithExpr::LastChar(offset) => block.emit(OpCode::PushLast, *offset as u64),
            ArithExpr::Lookup { table, index } => {
                let table_id = self.table_ids.get(table).copied().ok_or_else(|| {
                    CompileError::UndeclaredTable {
                        state: block.state.clone(),
                        rule: block.rule,
                        name: table.clone(),
                    }
                })?;
                self.lower_arith(block, index)?;
                block.emit(OpCode::Lookup, table_id as u64)
            }
            ArithExpr::Binary { op, lhs, rhs } => {
                self.lower_arith(block, lhs)?;
                self.lower_arith(block, rhs)?;
                let opcode = match op {
                    ArithOp::Add => OpCode::Add,
                    ArithOp::Sub => OpCode::Sub,
                    ArithOp::Mul => OpCode::Mul,
                    ArithOp::Div => OpCode::Div,
                };
                block.emit(opcode, 0)
            }
        }
    }
}
