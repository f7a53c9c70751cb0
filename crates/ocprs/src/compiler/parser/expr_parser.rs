// Expression parser
// Reads match/output items and `#` arithmetic by recursive descent.

use super::OcpParser;
use crate::compiler::ast::{ArithExpr, ArithOp, Expression};
use crate::compiler::error::{SyntaxError, SyntaxErrorKind};
use crate::limits::MAX_ARITH_DEPTH;
use smol_str::SmolStr;

type ParseResult<T> = Result<T, SyntaxError>;

impl OcpParser {
    /// Parse items until a character that cannot start one.
    /// That character is left unread.
    pub fn parse_expressions(&mut self) -> ParseResult<Vec<Expression>> {
        let mut exprs = Vec::new();
        loop {
            self.reader.skip_trivia();
            let Some(ch) = self.reader.next_char() else {
                return Ok(exprs);
            };

            match ch {
                '"' => self.parse_string(&mut exprs)?,
                '\\' => exprs.push(self.parse_reference()?),
                '#' => exprs.push(Expression::Arith(self.parse_arith()?)),
                '`' | '@' | '0'..='9' => {
                    self.reader.push_back();
                    exprs.push(Expression::Constant(self.parse_numeral()?));
                }
                _ => {
                    self.reader.push_back();
                    return Ok(exprs);
                }
            }
        }
    }

    /// Body of a `"…"` literal; the opening quote is already consumed
    fn parse_string(&mut self, exprs: &mut Vec<Expression>) -> ParseResult<()> {
        loop {
            match self.reader.next_char() {
                Some('"') => return Ok(()),
                Some(ch) => exprs.push(Expression::Constant(ch as u32)),
                None => return Err(self.error_here(SyntaxErrorKind::UnterminatedString)),
            }
        }
    }

    /// Reference after `\`
    fn parse_reference(&mut self) -> ParseResult<Expression> {
        match self.reader.next_char() {
            None => Err(self.error_here(SyntaxErrorKind::UnterminatedReference)),
            Some('$') => Ok(Expression::LastChar(0)),
            Some('*') => Ok(Expression::Some { min: 0, max: 0 }),
            Some('(') => self.parse_paren_reference(),
            Some(_) => {
                self.reader.push_back();
                Ok(Expression::CharRef(self.parse_numeral()?))
            }
        }
    }

    /// `\(` … `)`; the parenthesis is already consumed
    fn parse_paren_reference(&mut self) -> ParseResult<Expression> {
        match self.next_in_reference()? {
            '$' => {
                if self.next_in_reference()? != '-' {
                    return Err(self.malformed_reference());
                }
                let offset = self.reference_numeral()?;
                self.close_reference()?;
                Ok(Expression::LastChar(offset))
            }
            '*' => {
                let mut min = 0;
                let mut max = 0;
                if self.peek_in_reference()? == '+' {
                    self.reader.bump();
                    min = self.reference_numeral()?;
                }
                if self.peek_in_reference()? == '-' {
                    self.reader.bump();
                    max = self.reference_numeral()?;
                }
                self.close_reference()?;
                Ok(Expression::Some { min, max })
            }
            _ => Err(self.malformed_reference()),
        }
    }

    fn peek_in_reference(&mut self) -> ParseResult<char> {
        self.reader.eat_while(char::is_whitespace);
        self.reader
            .current_char()
            .ok_or_else(|| self.error_here(SyntaxErrorKind::UnterminatedReference))
    }

    fn next_in_reference(&mut self) -> ParseResult<char> {
        let ch = self.peek_in_reference()?;
        self.reader.bump();
        Ok(ch)
    }

    fn reference_numeral(&mut self) -> ParseResult<u32> {
        self.peek_in_reference()?;
        self.parse_numeral()
    }

    fn close_reference(&mut self) -> ParseResult<()> {
        if self.next_in_reference()? == ')' {
            Ok(())
        } else {
            Err(self.malformed_reference())
        }
    }

    /// Error for the character just read inside `\(`…`)`
    fn malformed_reference(&mut self) -> SyntaxError {
        self.reader.push_back();
        self.error_here(SyntaxErrorKind::MalformedReference)
    }

    /// Decimal digits, `` `c `` (character code), `@'` octal or `@"` hex
    pub(crate) fn parse_numeral(&mut self) -> ParseResult<u32> {
        match self.reader.next_char() {
            Some('`') => {
                let Some(ch) = self.reader.next_char() else {
                    return Err(self.error_here(SyntaxErrorKind::UnexpectedEof));
                };
                self.reader.eat('\'');
                Ok(ch as u32)
            }
            Some('@') => match self.reader.next_char() {
                Some('\'') => self.parse_digits(8),
                Some('"') => self.parse_digits(16),
                Some(_) => {
                    self.reader.push_back();
                    Err(self.error_here(SyntaxErrorKind::ExpectedNumber))
                }
                None => Err(self.error_here(SyntaxErrorKind::UnexpectedEof)),
            },
            Some(ch) if ch.is_ascii_digit() => {
                self.reader.push_back();
                self.parse_digits(10)
            }
            Some(_) => {
                self.reader.push_back();
                Err(self.error_here(SyntaxErrorKind::ExpectedNumber))
            }
            None => Err(self.error_here(SyntaxErrorKind::ExpectedNumber)),
        }
    }

    fn parse_digits(&mut self, radix: u32) -> ParseResult<u32> {
        let start = self.reader.offset();
        let mut value: u32 = 0;
        while let Some(digit) = self.reader.current_char().and_then(|ch| ch.to_digit(radix)) {
            value = value
                .checked_mul(radix)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| self.error_here(SyntaxErrorKind::NumberTooLarge))?;
            self.reader.bump();
        }
        if self.reader.offset() == start {
            return Err(self.error_here(SyntaxErrorKind::ExpectedNumber));
        }
        Ok(value)
    }

    // ===== Arithmetic =====
    //
    // expr   := term (("+" | "-") term)*
    // term   := factor (("*" | "/") factor)*
    // factor := numeral | "\" ref | NAME "[" expr "]" | "(" expr ")"

    pub(crate) fn parse_arith(&mut self) -> ParseResult<ArithExpr> {
        self.parse_sum()
    }

    fn parse_sum(&mut self) -> ParseResult<ArithExpr> {
        let mut lhs = self.parse_product()?;
        loop {
            self.reader.skip_trivia();
            let op = match (self.reader.current_char(), self.reader.peek_char(1)) {
                (Some('+'), _) => ArithOp::Add,
                // `->` is the rule arrow, not a subtraction
                (Some('-'), next) if next != Some('>') => ArithOp::Sub,
                _ => return Ok(lhs),
            };
            self.reader.bump();
            let rhs = self.parse_product()?;
            lhs = ArithExpr::binary(op, lhs, rhs);
        }
    }

    fn parse_product(&mut self) -> ParseResult<ArithExpr> {
        let mut lhs = self.parse_factor()?;
        loop {
            self.reader.skip_trivia();
            let op = match self.reader.current_char() {
                Some('*') => ArithOp::Mul,
                Some('/') => ArithOp::Div,
                _ => return Ok(lhs),
            };
            self.reader.bump();
            let rhs = self.parse_factor()?;
            lhs = ArithExpr::binary(op, lhs, rhs);
        }
    }

    fn parse_factor(&mut self) -> ParseResult<ArithExpr> {
        self.reader.skip_trivia();
        match self.reader.next_char() {
            None => Err(self.error_here(SyntaxErrorKind::UnexpectedEof)),
            Some('(') => {
                if self.depth >= MAX_ARITH_DEPTH {
                    self.reader.push_back();
                    return Err(self.error_here(SyntaxErrorKind::NestingTooDeep));
                }
                self.depth += 1;
                let inner = self.parse_sum();
                self.depth -= 1;
                let inner = inner?;
                self.expect(')', "`)`")?;
                Ok(inner)
            }
            Some('\\') => self.parse_arith_reference(),
            Some('`' | '@' | '0'..='9') => {
                self.reader.push_back();
                Ok(ArithExpr::Num(self.parse_numeral()?))
            }
            Some(ch) if is_name_start(ch) => {
                self.reader.push_back();
                let table = self.parse_name()?;
                self.expect('[', "`[`")?;
                let index = self.parse_sum()?;
                self.expect(']', "`]`")?;
                Ok(ArithExpr::Lookup {
                    table,
                    index: Box::new(index),
                })
            }
            Some(_) => {
                self.reader.push_back();
                Err(self.error_here(SyntaxErrorKind::Expected("arithmetic operand")))
            }
        }
    }

    /// `\n`, `\$` or `\($-n)` inside arithmetic
    fn parse_arith_reference(&mut self) -> ParseResult<ArithExpr> {
        match self.reader.next_char() {
            None => Err(self.error_here(SyntaxErrorKind::UnterminatedReference)),
            Some('$') => Ok(ArithExpr::LastChar(0)),
            Some('(') => {
                if self.next_in_reference()? != '$' || self.next_in_reference()? != '-' {
                    return Err(self.malformed_reference());
                }
                let offset = self.reference_numeral()?;
                self.close_reference()?;
                Ok(ArithExpr::LastChar(offset))
            }
            Some(_) => {
                self.reader.push_back();
                Ok(ArithExpr::CharRef(self.parse_numeral()?))
            }
        }
    }

    pub(crate) fn parse_name(&mut self) -> ParseResult<SmolStr> {
        let start = self.reader.offset();
        match self.reader.current_char() {
            Some(ch) if is_name_start(ch) => {}
            _ => return Err(self.error_here(SyntaxErrorKind::Expected("name"))),
        }
        self.reader.eat_while(is_name_char);
        Ok(SmolStr::new(self.reader.slice_from(start)))
    }
}

pub(crate) fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

pub(crate) fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
