/// Serde support for compiled programs
///
/// JSON export and import of a `Program`. Imported programs go through the
/// same verification as `load`, so hand-edited JSON cannot produce a
/// program that indexes out of range at run time.
use crate::program::{LoadError, Program, validate};

/// Convert a program to a serde_json::Value
pub fn program_to_json(program: &Program) -> Result<serde_json::Value, String> {
    serde_json::to_value(program).map_err(|e| e.to_string())
}

/// Convert a program to a JSON string
pub fn program_to_json_string(program: &Program, pretty: bool) -> Result<String, String> {
    let result = if pretty {
        serde_json::to_string_pretty(program)
    } else {
        serde_json::to_string(program)
    };
    result.map_err(|e| e.to_string())
}

/// Rebuild a program from a serde_json::Value
pub fn program_from_json(json: &serde_json::Value) -> Result<Program, LoadError> {
    let program: Program = serde_json::from_value(json.clone())
        .map_err(|e| LoadError::Malformed(e.to_string()))?;
    validate(program)
}

/// Rebuild a program from a JSON string
pub fn program_from_json_str(json: &str) -> Result<Program, LoadError> {
    let program: Program =
        serde_json::from_str(json).map_err(|e| LoadError::Malformed(e.to_string()))?;
    validate(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{compile, execute_str};

    #[test]
    fn test_json_round_trip() {
        let program = compile("state S: \"a\" -> \"1\"; \\* -> \\$;").unwrap();
        let json = program_to_json(&program).unwrap();
        let back = program_from_json(&json).unwrap();
        assert_eq!(back, program);
        assert_eq!(execute_str(&back, "abc").unwrap(), "1bc");
    }

    #[test]
    fn test_json_with_bad_goto_is_rejected() {
        let program = compile("state S: \"a\" -> \"1\" => S;").unwrap();
        let text = program_to_json_string(&program, false).unwrap();
        // Retarget the block's final GOTO to a state that does not exist
        let goto = crate::Instruction::new(crate::OpCode::Goto, 0).as_u32();
        let bad = crate::Instruction::new(crate::OpCode::Goto, 7).as_u32();
        let edited = text.replace(&format!(",{goto}]"), &format!(",{bad}]"));
        assert_ne!(edited, text);
        assert!(matches!(
            program_from_json_str(&edited),
            Err(LoadError::InvalidBlock { .. })
        ));
    }
}
