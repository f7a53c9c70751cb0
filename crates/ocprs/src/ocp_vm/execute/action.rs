/// Action instructions
///
/// Advance opcodes append to `Scratch::emitted`, requeue opcodes to
/// `Scratch::requeued`. The block ends at GOTO or STAY.
use super::{Applied, RuleExecutor, RuleOutcome};
use crate::limits::MAX_CHAR_CODE;
use crate::ocp_vm::opcode::OpFamily;
use crate::ocp_vm::{FaultKind, OpCode, Phase};
use crate::program::StateId;

impl RuleExecutor<'_, '_> {
    pub(super) fn run_actions(&mut self, start: usize, len: usize) -> Result<RuleOutcome, FaultKind> {
        let mut pc = start;
        loop {
            let instruction = *self.code.get(pc).ok_or(FaultKind::InvalidProgram)?;
            if !self.notify(pc, Phase::Action, len, instruction) {
                return Ok(RuleOutcome::Stopped);
            }
            let op = instruction.try_opcode().ok_or(FaultKind::InvalidProgram)?;

            match op.family() {
                OpFamily::Arith => self.exec_arith(instruction, len)?,
                OpFamily::Advance => self.exec_emit(op, instruction.arg(), pc, len, false)?,
                OpFamily::Requeue => self.exec_emit(op, instruction.arg(), pc, len, true)?,
                OpFamily::Transition => {
                    let next = (op == OpCode::Goto).then(|| StateId(instruction.arg()));
                    return Ok(RuleOutcome::Applied(Applied {
                        consumed: len,
                        next,
                    }));
                }
                OpFamily::Match | OpFamily::Extra => return Err(FaultKind::InvalidProgram),
            }

            pc += if op.takes_extra_arg() { 2 } else { 1 };
        }
    }

    fn exec_emit(
        &mut self,
        op: OpCode,
        arg: u32,
        pc: usize,
        len: usize,
        requeue: bool,
    ) -> Result<(), FaultKind> {
        match op {
            OpCode::OutNum | OpCode::PbackNum => self.sink(requeue).push(arg),
            OpCode::OutChar | OpCode::PbackChar => {
                let code = self.char_ref(len, arg)?;
                self.sink(requeue).push(code);
            }
            OpCode::OutLast | OpCode::PbackLast => {
                let code = self.last_char(len, arg)?;
                self.sink(requeue).push(code);
            }
            OpCode::OutSome | OpCode::PbackSome => {
                // matched[arg .. len - tail], empty when the bounds cross
                let tail = self.extra_arg(pc)? as usize;
                let start = arg as usize;
                let end = len.saturating_sub(tail);
                if start < end {
                    let input = self.input;
                    self.sink(requeue).extend_from_slice(&input[start..end]);
                }
            }
            OpCode::OutValue | OpCode::PbackValue => {
                let value = self.pop()?;
                if !(0..=MAX_CHAR_CODE).contains(&value) {
                    return Err(FaultKind::CodeOutOfRange(value));
                }
                self.sink(requeue).push(value as u32);
            }
            _ => return Err(FaultKind::InvalidProgram),
        }
        Ok(())
    }

    #[inline(always)]
    fn sink(&mut self, requeue: bool) -> &mut Vec<u32> {
        if requeue {
            &mut self.scratch.requeued
        } else {
            &mut self.scratch.emitted
        }
    }
}
