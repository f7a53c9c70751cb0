/*----------------------------------------------------------------------
  OCP instruction encoding

  Every instruction is one 32-bit word:

        3 3 2 2 2 2 2 2 2 2 2 2 1 1 1 1 1 1 1 1 1 1 0 0 0 0 0 0 0 0 0 0
        1 0 9 8 7 6 5 4 3 2 1 0 9 8 7 6 5 4 3 2 1 0 9 8 7 6 5 4 3 2 1 0
  iA                      A(24)                        |    Op(8)      |

  Operands are unsigned. Opcodes that need two operands are followed by
  an EXTRAARG word carrying the second one.
----------------------------------------------------------------------*/

use crate::OpCode;

/// Packed (opcode, operand) pair
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction(u32);

impl Instruction {
    // Size of each field
    pub const SIZE_OP: u32 = 8;
    pub const SIZE_A: u32 = 24;

    // Position of each field
    pub const POS_OP: u32 = 0;
    pub const POS_A: u32 = Self::POS_OP + Self::SIZE_OP;

    /// Largest operand the encoding can carry
    pub const MAX_ARG: u32 = (1 << Self::SIZE_A) - 1;

    const MASK_OP: u32 = (1 << Self::SIZE_OP) - 1;

    /// Build an instruction; the operand must already be range-checked
    #[inline(always)]
    pub fn new(op: OpCode, arg: u32) -> Self {
        debug_assert!(arg <= Self::MAX_ARG, "operand {arg} does not fit");
        Self(((arg & Self::MAX_ARG) << Self::POS_A) | ((op as u32) << Self::POS_OP))
    }

    /// Create an Instruction from a raw u32 value without validating the opcode
    #[inline(always)]
    pub const fn from_u32(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw u32 value of this instruction
    #[inline(always)]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub fn opcode_byte(self) -> u8 {
        ((self.0 >> Self::POS_OP) & Self::MASK_OP) as u8
    }

    /// Decoded opcode, `None` for bytes outside the opcode set
    #[inline(always)]
    pub fn try_opcode(self) -> Option<OpCode> {
        OpCode::from_u8(self.opcode_byte())
    }

    /// Decoded opcode. Programs are verified on construction and load, so an
    /// unknown byte can only come from `from_u32`; it decodes as `ExtraArg`,
    /// which no block executes.
    #[inline(always)]
    pub fn opcode(self) -> OpCode {
        self.try_opcode().unwrap_or(OpCode::ExtraArg)
    }

    #[inline(always)]
    pub fn arg(self) -> u32 {
        self.0 >> Self::POS_A
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.try_opcode() {
            Some(op) => write!(f, "{} {}", op.name(), self.arg()),
            None => write!(f, "?{:#04x} {}", self.opcode_byte(), self.arg()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let i = Instruction::new(OpCode::Goto, 0x12_3456);
        assert_eq!(i.opcode(), OpCode::Goto);
        assert_eq!(i.arg(), 0x12_3456);

        let max = Instruction::new(OpCode::OutNum, Instruction::MAX_ARG);
        assert_eq!(max.arg(), Instruction::MAX_ARG);
        assert_eq!(max.opcode(), OpCode::OutNum);
    }

    #[test]
    fn test_unknown_opcode_byte() {
        let raw = Instruction::from_u32(0xFF);
        assert_eq!(raw.try_opcode(), None);
        assert_eq!(raw.to_string(), "?0xff 0");
    }

    #[test]
    fn test_requeue_variant() {
        assert_eq!(OpCode::OutSome.requeue_variant(), OpCode::PbackSome);
        assert_eq!(OpCode::Goto.requeue_variant(), OpCode::Goto);
        assert!(OpCode::PbackSome.takes_extra_arg());
    }
}
