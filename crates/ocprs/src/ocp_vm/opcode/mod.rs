mod instruction;

pub use instruction::Instruction;

/// Instruction families, used by the verifier and the disassembler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpFamily {
    Match,
    Arith,
    Advance,
    Requeue,
    Transition,
    Extra,
}

/// Complete OCP opcode set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum OpCode {
    // Pattern matching
    MatchChar = 0, // in[len] == A
    MatchRef,      // in[len] == matched[A]          (1-based)
    MatchLast,     // in[len] == matched[len-1-A]
    MatchValue,    // in[len] == pop()
    MatchSome,     // run of A..=EXTRA chars (EXTRA == 0: unbounded)
    Commit,        // pattern matched, actions follow

    // Arithmetic (accumulator stack)
    PushNum,  // push A
    PushChar, // push matched[A]
    PushLast, // push matched[len-1-A]
    Add,      // push(pop2 + pop1)
    Sub,      // push(pop2 - pop1)
    Mul,      // push(pop2 * pop1)
    Div,      // push(pop2 / pop1), truncating
    Lookup,   // push(TABLE[A][pop()])

    // Emit and advance
    OutNum,   // out A
    OutChar,  // out matched[A]
    OutLast,  // out matched[len-1-A]
    OutSome,  // out matched[A .. len-EXTRA]
    OutValue, // out pop()

    // Emit and requeue (push back into the input)
    PbackNum,
    PbackChar,
    PbackLast,
    PbackSome,
    PbackValue,

    // Transitions
    Goto, // state := A
    Stay, // state unchanged

    // Extra argument
    ExtraArg, // second operand for the previous opcode
}

impl OpCode {
    pub const COUNT: u8 = OpCode::ExtraArg as u8 + 1;

    /// Decode an opcode byte, rejecting values outside the opcode set
    pub fn from_u8(byte: u8) -> Option<Self> {
        use OpCode::*;
        const TABLE: [OpCode; OpCode::COUNT as usize] = [
            MatchChar, MatchRef, MatchLast, MatchValue, MatchSome, Commit, PushNum, PushChar,
            PushLast, Add, Sub, Mul, Div, Lookup, OutNum, OutChar, OutLast, OutSome, OutValue,
            PbackNum, PbackChar, PbackLast, PbackSome, PbackValue, Goto, Stay, ExtraArg,
        ];
        TABLE.get(byte as usize).copied()
    }

    pub fn family(self) -> OpFamily {
        use OpCode::*;
        match self {
            MatchChar | MatchRef | MatchLast | MatchValue | MatchSome | Commit => OpFamily::Match,
            PushNum | PushChar | PushLast | Add | Sub | Mul | Div | Lookup => OpFamily::Arith,
            OutNum | OutChar | OutLast | OutSome | OutValue => OpFamily::Advance,
            PbackNum | PbackChar | PbackLast | PbackSome | PbackValue => OpFamily::Requeue,
            Goto | Stay => OpFamily::Transition,
            ExtraArg => OpFamily::Extra,
        }
    }

    /// Opcodes that consume the following `ExtraArg`
    pub fn takes_extra_arg(self) -> bool {
        matches!(self, OpCode::MatchSome | OpCode::OutSome | OpCode::PbackSome)
    }

    /// Requeue twin of an advance opcode (and vice versa for requeue opcodes)
    pub fn requeue_variant(self) -> Self {
        use OpCode::*;
        match self {
            OutNum => PbackNum,
            OutChar => PbackChar,
            OutLast => PbackLast,
            OutSome => PbackSome,
            OutValue => PbackValue,
            other => other,
        }
    }

    pub fn name(self) -> &'static str {
        use OpCode::*;
        match self {
            MatchChar => "MATCHCHAR",
            MatchRef => "MATCHREF",
            MatchLast => "MATCHLAST",
            MatchValue => "MATCHVALUE",
            MatchSome => "MATCHSOME",
            Commit => "COMMIT",
            PushNum => "PUSHNUM",
            PushChar => "PUSHCHAR",
            PushLast => "PUSHLAST",
            Add => "ADD",
            Sub => "SUB",
            Mul => "MUL",
            Div => "DIV",
            Lookup => "LOOKUP",
            OutNum => "OUTNUM",
            OutChar => "OUTCHAR",
            OutLast => "OUTLAST",
            OutSome => "OUTSOME",
            OutValue => "OUTVALUE",
            PbackNum => "PBACKNUM",
            PbackChar => "PBACKCHAR",
            PbackLast => "PBACKLAST",
            PbackSome => "PBACKSOME",
            PbackValue => "PBACKVALUE",
            Goto => "GOTO",
            Stay => "STAY",
            ExtraArg => "EXTRAARG",
        }
    }
}

impl std::fmt::Display for OpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
