// Expression and declaration parsing
use crate::compiler::ast::{ArithExpr, ArithOp, Expression};
use crate::compiler::parser::parse_expression_list;
use crate::compiler::parse;
use crate::*;
use pretty_assertions::assert_eq;

fn syntax_kinds(source: &str) -> Vec<SyntaxErrorKind> {
    let errors = compile(source).unwrap_err();
    errors
        .errors()
        .iter()
        .map(|err| match err {
            CompileError::Syntax(syntax) => syntax.kind,
            other => panic!("expected a syntax error, got {other}"),
        })
        .collect()
}

#[test]
fn test_every_item_form() {
    let exprs =
        parse_expression_list(r#""ab" \3 \$ \* \($-2) \(*+1-2) `x @'17 @"1F 42"#).unwrap();
    assert_eq!(
        exprs,
        vec![
            Expression::Constant('a' as u32),
            Expression::Constant('b' as u32),
            Expression::CharRef(3),
            Expression::LastChar(0),
            Expression::Some { min: 0, max: 0 },
            Expression::LastChar(2),
            Expression::Some { min: 1, max: 2 },
            Expression::Constant('x' as u32),
            Expression::Constant(0o17),
            Expression::Constant(0x1F),
            Expression::Constant(42),
        ]
    );
}

#[test]
fn test_omitted_bounds_default_to_zero() {
    assert_eq!(
        parse_expression_list(r"\(*) \(*+4) \(*-3) \( * + 1 - 2 )").unwrap(),
        vec![
            Expression::Some { min: 0, max: 0 },
            Expression::Some { min: 4, max: 0 },
            Expression::Some { min: 0, max: 3 },
            Expression::Some { min: 1, max: 2 },
        ]
    );
}

#[test]
fn test_char_literal_accepts_closing_quote() {
    assert_eq!(
        parse_expression_list("`a' `b").unwrap(),
        vec![Expression::Constant(97), Expression::Constant(98)]
    );
}

#[test]
fn test_stop_character_is_left_unread() {
    let err = parse_expression_list(r#""a" ;"#).unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Expected("expression"));
    assert_eq!(err.found, Some(';'));
    assert_eq!((err.line, err.column), (1, 5));
}

#[test]
fn test_arithmetic_precedence_and_associativity() {
    let exprs = parse_expression_list(r"#(\1 - 2 - 3 * \$)").unwrap();
    let expected = ArithExpr::binary(
        ArithOp::Sub,
        ArithExpr::binary(ArithOp::Sub, ArithExpr::CharRef(1), ArithExpr::Num(2)),
        ArithExpr::binary(ArithOp::Mul, ArithExpr::Num(3), ArithExpr::LastChar(0)),
    );
    assert_eq!(exprs, vec![Expression::Arith(expected)]);
}

#[test]
fn test_arithmetic_stops_at_rule_arrow() {
    let unit = parse(r"#\1->#\1-1;").unwrap();
    let rule = &unit.states[0].rules[0];
    assert_eq!(rule.pattern, vec![Expression::Arith(ArithExpr::CharRef(1))]);
    assert_eq!(
        rule.actions[0].expr,
        Expression::Arith(ArithExpr::binary(
            ArithOp::Sub,
            ArithExpr::CharRef(1),
            ArithExpr::Num(1)
        ))
    );

    let unit = parse(r"#T[\($-1)]->1;").unwrap();
    let rule = &unit.states[0].rules[0];
    assert_eq!(
        rule.pattern,
        vec![Expression::Arith(ArithExpr::Lookup {
            table: "T".into(),
            index: Box::new(ArithExpr::LastChar(1)),
        })]
    );
}

#[test]
fn test_unterminated_reference() {
    let errors = compile(r"\(*+2-").unwrap_err();
    assert_eq!(errors.len(), 1);
    match errors.first() {
        CompileError::Syntax(err) => {
            assert_eq!(err.kind, SyntaxErrorKind::UnterminatedReference);
            assert_eq!(err.found, None);
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(errors.to_string().contains("unterminated reference"));
}

#[test]
fn test_syntax_fault_kinds() {
    assert_eq!(
        syntax_kinds(r#"state S: "abc"#),
        vec![SyntaxErrorKind::UnterminatedString]
    );
    assert_eq!(
        syntax_kinds(r"state S: \(x) -> 1;"),
        vec![SyntaxErrorKind::MalformedReference]
    );
    assert_eq!(
        syntax_kinds(r"state S: \(*+z) -> 1;"),
        vec![SyntaxErrorKind::ExpectedNumber]
    );
    assert_eq!(syntax_kinds("state S: `"), vec![SyntaxErrorKind::UnexpectedEof]);
    assert_eq!(
        syntax_kinds("state S: 99999999999 -> 1;"),
        vec![SyntaxErrorKind::NumberTooLarge]
    );
    assert_eq!(
        syntax_kinds(r#"state S: "a" "b";"#),
        vec![SyntaxErrorKind::Expected("`->`")]
    );
}

#[test]
fn test_malformed_reference_reports_offending_char() {
    let errors = compile("state S:\n  \\(q) -> 1;").unwrap_err();
    let CompileError::Syntax(err) = errors.first() else {
        panic!("expected a syntax error");
    };
    assert_eq!(err.found, Some('q'));
    assert_eq!((err.line, err.column), (2, 5));
    assert_eq!(err.to_string(), "2:5: malformed reference near 'q'");
}

#[test]
fn test_recovery_reports_several_errors() {
    let kinds = syntax_kinds(r#"state S: \(q) -> "1"; \(*+1 -> "2"; "c" -> "3";"#);
    assert_eq!(
        kinds,
        vec![
            SyntaxErrorKind::MalformedReference,
            SyntaxErrorKind::ExpectedNumber,
        ]
    );
}

#[test]
fn test_nesting_limit() {
    let source = format!(
        "state S: #{}1{} -> 1;",
        "(".repeat(limits::MAX_ARITH_DEPTH + 1),
        ")".repeat(limits::MAX_ARITH_DEPTH + 1)
    );
    assert_eq!(syntax_kinds(&source), vec![SyntaxErrorKind::NestingTooDeep]);
}

#[test]
fn test_declarations() {
    let unit = parse(
        r#"
        % lookup tables come first by convention
        table DIGITS = { `0, `1, @"32 };
        state Start:
            "a" -> "b" <- \$ => Other;
        state Other:
            \* -> \$;
        "#,
    )
    .unwrap();

    assert_eq!(unit.tables.len(), 1);
    assert_eq!(unit.tables[0].name, "DIGITS");
    assert_eq!(unit.tables[0].values, vec![48, 49, 50]);
    assert_eq!(unit.tables[0].line, 3);

    let names: Vec<&str> = unit.states.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["Start", "Other"]);

    let rule = &unit.states[0].rules[0];
    assert_eq!(rule.line, 5);
    assert_eq!(rule.next_state.as_deref(), Some("Other"));
    let modes: Vec<bool> = rule.actions.iter().map(|a| a.push_back).collect();
    assert_eq!(modes, vec![false, true]);
}

#[test]
fn test_rules_before_any_state_use_implicit_state() {
    let unit = parse(r#""a" -> "b"; state Later: "b" -> "c";"#).unwrap();
    let names: Vec<&str> = unit.states.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec![limits::IMPLICIT_STATE, "Later"]);
    assert_eq!(unit.states[0].rules.len(), 1);
}

#[test]
fn test_keyword_needs_word_boundary() {
    // `states` is not the keyword; it is an unknown character run
    let errors = compile("states S:").unwrap_err();
    assert!(matches!(errors.first(), CompileError::Syntax(_)));
}
