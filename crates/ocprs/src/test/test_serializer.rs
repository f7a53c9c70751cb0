// Binary program container
use super::program;
use crate::*;
use pretty_assertions::assert_eq;

const SOURCE: &str = r#"
    table UPPER = {65, 66, 67};
    state Start: "a" -> "1" => Other;
                 \(*+1-2) "!" -> #UPPER[\1 - `x] <- \$;
                 \* -> \$;
    state Other: "b" -> \(*) => Start;
"#;

#[test]
fn test_round_trip_preserves_program_and_output() {
    let compiled = program(SOURCE);
    let bytes = compiled.serialize();
    assert_eq!(&bytes[..4], limits::PROGRAM_MAGIC);
    assert_eq!(bytes[4], limits::PROGRAM_VERSION);

    let loaded = load(&bytes).unwrap();
    assert_eq!(loaded, compiled);
    for input in ["abz!", "y!x!", "ab", ""] {
        assert_eq!(
            execute_str(&loaded, input),
            execute_str(&compiled, input),
            "input {input:?}"
        );
    }
    assert_eq!(execute_str(&loaded, "abz!").unwrap(), "1bC!");
}

#[test]
fn test_bad_header() {
    assert_eq!(load(b"nope"), Err(LoadError::BadMagic));
    assert_eq!(load(b"\x1bOC"), Err(LoadError::BadMagic));
    assert_eq!(load(b"\x1bOCP"), Err(LoadError::Truncated));

    let mut bytes = program(SOURCE).serialize();
    bytes[4] = 99;
    assert_eq!(load(&bytes), Err(LoadError::UnsupportedVersion(99)));
}

#[test]
fn test_truncated_and_trailing_data() {
    let bytes = program(SOURCE).serialize();
    assert_eq!(load(&bytes[..bytes.len() - 2]), Err(LoadError::Truncated));

    let mut longer = bytes.clone();
    longer.push(0);
    assert!(matches!(load(&longer), Err(LoadError::Malformed(_))));
}

#[test]
fn test_corrupt_instruction_is_rejected() {
    let mut bytes = program(SOURCE).serialize();
    // last word is the final transition of the last rule
    let len = bytes.len();
    bytes[len - 4..].copy_from_slice(&0xFFu32.to_le_bytes());
    match load(&bytes) {
        Err(LoadError::InvalidBlock { state, rule, reason }) => {
            assert_eq!((state, rule), (1, 0));
            assert_eq!(reason, "invalid opcode 0xff");
        }
        other => panic!("unexpected result {other:?}"),
    }
}

#[test]
fn test_out_of_range_goto_is_rejected() {
    let mut bytes = program(SOURCE).serialize();
    let len = bytes.len();
    let goto = Instruction::new(OpCode::Goto, 9).as_u32();
    bytes[len - 4..].copy_from_slice(&goto.to_le_bytes());
    assert!(matches!(
        load(&bytes),
        Err(LoadError::InvalidBlock { state: 1, rule: 0, .. })
    ));
}

#[test]
fn test_misplaced_opcode_is_rejected() {
    // MATCHCHAR after COMMIT
    let mut bytes = program(r#"state S: "a" -> "b";"#).serialize();
    let len = bytes.len();
    let out = Instruction::new(OpCode::MatchChar, 98).as_u32();
    bytes[len - 8..len - 4].copy_from_slice(&out.to_le_bytes());
    let err = load(&bytes).unwrap_err();
    assert_eq!(err.to_string(), "state 0, rule 0: MATCHCHAR out of place");
}
