/// Arithmetic instructions
///
/// Postfix evaluation over the scratch stack. Values are `i64`; every
/// operation is checked, so overflow is a fault rather than a wrap.
use super::RuleExecutor;
use crate::ocp_vm::{FaultKind, Instruction, OpCode};

impl RuleExecutor<'_, '_> {
    pub(super) fn exec_arith(&mut self, instruction: Instruction, len: usize) -> Result<(), FaultKind> {
        let arg = instruction.arg();
        let value = match instruction.opcode() {
            OpCode::PushNum => arg as i64,
            OpCode::PushChar => self.char_ref(len, arg)? as i64,
            OpCode::PushLast => self.last_char(len, arg)? as i64,
            op @ (OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div) => {
                let rhs = self.pop()?;
                let lhs = self.pop()?;
                binary(op, lhs, rhs)?
            }
            OpCode::Lookup => {
                let index = self.pop()?;
                self.lookup(arg, index)?
            }
            _ => return Err(FaultKind::InvalidProgram),
        };
        self.scratch.stack.push(value);
        Ok(())
    }

    #[inline(always)]
    pub(super) fn pop(&mut self) -> Result<i64, FaultKind> {
        self.scratch.stack.pop().ok_or(FaultKind::StackUnderflow)
    }

    /// TABLE[table][index]
    fn lookup(&self, table: u32, index: i64) -> Result<i64, FaultKind> {
        let values = self
            .program
            .tables()
            .get(table as usize)
            .ok_or(FaultKind::InvalidProgram)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| values.get(i))
            .map(|&value| value as i64)
            .ok_or(FaultKind::TableIndexOutOfBounds { table, index })
    }
}

/// Division truncates toward zero
fn binary(op: OpCode, lhs: i64, rhs: i64) -> Result<i64, FaultKind> {
    let result = match op {
        OpCode::Add => lhs.checked_add(rhs),
        OpCode::Sub => lhs.checked_sub(rhs),
        OpCode::Mul => lhs.checked_mul(rhs),
        OpCode::Div => {
            if rhs == 0 {
                return Err(FaultKind::DivisionByZero);
            }
            lhs.checked_div(rhs)
        }
        _ => return Err(FaultKind::InvalidProgram),
    };
    result.ok_or(FaultKind::ArithmeticOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_division_truncates_toward_zero() {
        assert_eq!(binary(OpCode::Div, 7, 2), Ok(3));
        assert_eq!(binary(OpCode::Div, -7, 2), Ok(-3));
        assert_eq!(binary(OpCode::Div, 7, 0), Err(FaultKind::DivisionByZero));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(
            binary(OpCode::Mul, i64::MAX, 2),
            Err(FaultKind::ArithmeticOverflow)
        );
        assert_eq!(
            binary(OpCode::Div, i64::MIN, -1),
            Err(FaultKind::ArithmeticOverflow)
        );
    }
}
