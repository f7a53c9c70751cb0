mod expr_parser;
mod reader;

pub use reader::{Location, Reader};

use crate::compiler::ast::{Action, Expression, Rule, SourceUnit, StateDecl, TableDecl};
use crate::compiler::error::{SyntaxError, SyntaxErrorKind};
use crate::limits::{IMPLICIT_STATE, KW_STATE, KW_TABLE};
use smol_str::SmolStr;

/// Recursive-descent parser for transliteration sources.
///
/// Rules that appear before any `state` declaration belong to the implicit
/// `INITIAL` state.
///
/// ```text
/// unit  := (table | state)*
/// table := "table" NAME "=" "{" [numeral ("," numeral)*] "}" ";"
/// state := "state" NAME ":" rule*
/// rule  := exprs "->" exprs ["<-" exprs] ["=>" NAME] ";"
/// ```
pub struct OcpParser {
    reader: Reader,
    depth: usize,
}

impl OcpParser {
    pub fn new(text: &str) -> Self {
        OcpParser {
            reader: Reader::new(text),
            depth: 0,
        }
    }

    /// Parse a whole unit. A syntax error skips to the next `;` so that
    /// later rules are still checked; all errors are returned together.
    pub fn parse_unit(&mut self) -> Result<SourceUnit, Vec<SyntaxError>> {
        let mut unit = SourceUnit::default();
        let mut errors = Vec::new();

        loop {
            self.reader.skip_trivia();
            if self.reader.is_eof() {
                break;
            }

            let result = match self.peek_keyword() {
                Some(KW_STATE) => self.parse_state_header().map(|state| unit.states.push(state)),
                Some(KW_TABLE) => self.parse_table().map(|table| unit.tables.push(table)),
                _ => {
                    if unit.states.is_empty() {
                        unit.states.push(StateDecl {
                            name: SmolStr::new_static(IMPLICIT_STATE),
                            rules: Vec::new(),
                            line: self.reader.location().line,
                        });
                    }
                    self.parse_rule().map(|rule| {
                        if let Some(state) = unit.states.last_mut() {
                            state.rules.push(rule);
                        }
                    })
                }
            };

            if let Err(err) = result {
                log::debug!("syntax error: {err}");
                errors.push(err);
                self.reader.recover_to_semicolon();
            }
        }

        if errors.is_empty() {
            Ok(unit)
        } else {
            Err(errors)
        }
    }

    fn peek_keyword(&self) -> Option<&'static str> {
        for keyword in [KW_STATE, KW_TABLE] {
            let matches = keyword
                .chars()
                .enumerate()
                .all(|(i, ch)| self.reader.peek_char(i) == Some(ch));
            let boundary = self
                .reader
                .peek_char(keyword.len())
                .is_none_or(|ch| !expr_parser::is_name_char(ch));
            if matches && boundary {
                return Some(keyword);
            }
        }
        None
    }

    /// `state NAME :`
    fn parse_state_header(&mut self) -> Result<StateDecl, SyntaxError> {
        let line = self.reader.location().line;
        self.reader.eat_while(expr_parser::is_name_char);
        self.reader.skip_trivia();
        let name = self.parse_name()?;
        self.expect(':', "`:`")?;
        Ok(StateDecl {
            name,
            rules: Vec::new(),
            line,
        })
    }

    /// `table NAME = { v, v, … } ;`
    fn parse_table(&mut self) -> Result<TableDecl, SyntaxError> {
        let line = self.reader.location().line;
        self.reader.eat_while(expr_parser::is_name_char);
        self.reader.skip_trivia();
        let name = self.parse_name()?;
        self.expect('=', "`=`")?;
        self.expect('{', "`{`")?;

        let mut values = Vec::new();
        self.reader.skip_trivia();
        if !self.reader.eat('}') {
            loop {
                self.reader.skip_trivia();
                values.push(self.parse_numeral()?);
                self.reader.skip_trivia();
                if self.reader.eat('}') {
                    break;
                }
                self.expect(',', "`,` or `}`")?;
            }
        }
        self.expect(';', "`;`")?;

        Ok(TableDecl { name, values, line })
    }

    /// `pattern -> outputs [<- pushbacks] [=> NAME] ;`
    fn parse_rule(&mut self) -> Result<Rule, SyntaxError> {
        let line = self.reader.location().line;
        let pattern = self.parse_expressions()?;
        self.expect_arrow('-', '>', "`->`")?;

        let mut actions: Vec<Action> = self
            .parse_expressions()?
            .into_iter()
            .map(|expr| Action {
                expr,
                push_back: false,
            })
            .collect();

        self.reader.skip_trivia();
        if self.reader.current_char() == Some('<') && self.reader.peek_char(1) == Some('-') {
            self.reader.bump();
            self.reader.bump();
            actions.extend(self.parse_expressions()?.into_iter().map(|expr| Action {
                expr,
                push_back: true,
            }));
        }

        self.reader.skip_trivia();
        let next_state = if self.reader.current_char() == Some('=') {
            self.expect_arrow('=', '>', "`=>`")?;
            self.reader.skip_trivia();
            Some(self.parse_name()?)
        } else {
            None
        };

        self.expect(';', "`;`")?;

        Ok(Rule {
            pattern,
            actions,
            next_state,
            line,
        })
    }

    fn expect_arrow(
        &mut self,
        first: char,
        second: char,
        what: &'static str,
    ) -> Result<(), SyntaxError> {
        self.reader.skip_trivia();
        if self.reader.current_char() == Some(first) && self.reader.peek_char(1) == Some(second) {
            self.reader.bump();
            self.reader.bump();
            Ok(())
        } else {
            Err(self.error_here(SyntaxErrorKind::Expected(what)))
        }
    }

    fn expect(&mut self, ch: char, what: &'static str) -> Result<(), SyntaxError> {
        self.reader.skip_trivia();
        if self.reader.eat(ch) {
            Ok(())
        } else {
            Err(self.error_here(SyntaxErrorKind::Expected(what)))
        }
    }

    /// Error located at the next unread character
    fn error_here(&self, kind: SyntaxErrorKind) -> SyntaxError {
        let Location { line, column } = self.reader.location();
        SyntaxError {
            kind,
            found: self.reader.current_char(),
            line,
            column,
        }
    }

    /// True once all input has been read
    pub fn at_end(&mut self) -> bool {
        self.reader.skip_trivia();
        self.reader.is_eof()
    }
}

/// Parse a standalone expression list, failing on anything left over
pub fn parse_expression_list(text: &str) -> Result<Vec<Expression>, SyntaxError> {
    let mut parser = OcpParser::new(text);
    let exprs = parser.parse_expressions()?;
    if !parser.at_end() {
        return Err(parser.error_here(SyntaxErrorKind::Expected("expression")));
    }
    Ok(exprs)
}
