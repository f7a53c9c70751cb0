// Source-level representation of a transliteration unit.
// Built once by the parser, consumed by code generation, never mutated.

use smol_str::SmolStr;

/// One match or output item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Literal character code
    Constant(u32),
    /// Matched character by absolute, 1-based index (`\n`)
    CharRef(u32),
    /// Character `offset` places before the end of the match so far (`\$`, `\($-n)`)
    LastChar(u32),
    /// Run of characters with length in `[min, max]`; `max == 0` is unbounded.
    /// In an action it copies matched characters `[min, len - max)`.
    Some { min: u32, max: u32 },
    /// Computed character code (`#`)
    Arith(ArithExpr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArithExpr {
    Num(u32),
    CharRef(u32),
    LastChar(u32),
    Lookup {
        table: SmolStr,
        index: Box<ArithExpr>,
    },
    Binary {
        op: ArithOp,
        lhs: Box<ArithExpr>,
        rhs: Box<ArithExpr>,
    },
}

impl ArithExpr {
    pub fn binary(op: ArithOp, lhs: ArithExpr, rhs: ArithExpr) -> Self {
        ArithExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

/// Action item with its output mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub expr: Expression,
    /// Requeue into the input instead of emitting
    pub push_back: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub pattern: Vec<Expression>,
    pub actions: Vec<Action>,
    pub next_state: Option<SmolStr>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateDecl {
    pub name: SmolStr,
    pub rules: Vec<Rule>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDecl {
    pub name: SmolStr,
    pub values: Vec<u32>,
    pub line: u32,
}

/// Everything declared in one source text, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceUnit {
    pub tables: Vec<TableDecl>,
    pub states: Vec<StateDecl>,
}
