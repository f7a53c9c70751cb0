//! Command parsing for the debugger

/// Every command word, in the order `help` lists them
pub const COMMAND_WORDS: [&str; 9] = [
    "help", "status", "quit", "halt", "stop", "exit", "run", "step", "trace",
];

/// A parsed debugger command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    /// Show the machine state and the rules of the current state
    Status,
    /// Apply one rule
    Step,
    /// Step until the machine halts
    Run,
    /// `None` toggles
    Trace(Option<bool>),
    /// End the session (`quit`, `halt`, `stop` and `exit`)
    Quit,
    /// Blank line or comment
    Empty,
    /// Prefix shared by several commands
    Ambiguous {
        word: String,
        candidates: Vec<&'static str>,
    },
    Unknown(String),
    /// Known command with an argument it does not accept
    BadArgument {
        command: &'static str,
        argument: String,
    },
}

/// Parse a command line. Command words may be abbreviated to any
/// unambiguous prefix.
pub fn parse(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Command::Empty;
    }

    let mut parts = line.splitn(2, char::is_whitespace);
    let word = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim();

    let command = match resolve(word) {
        Ok(command) => command,
        Err(err) => return err,
    };

    match command {
        "trace" => parse_trace(args),
        _ if !args.is_empty() => Command::BadArgument {
            command,
            argument: args.to_string(),
        },
        "help" => Command::Help,
        "status" => Command::Status,
        "run" => Command::Run,
        "step" => Command::Step,
        _ => Command::Quit,
    }
}

/// Map a possibly abbreviated word to its command word
fn resolve(word: &str) -> Result<&'static str, Command> {
    let lowered = word.to_ascii_lowercase();
    if let Some(&exact) = COMMAND_WORDS.iter().find(|&&c| c == lowered) {
        return Ok(exact);
    }

    let candidates: Vec<&'static str> = COMMAND_WORDS
        .iter()
        .copied()
        .filter(|c| c.starts_with(lowered.as_str()))
        .collect();
    match candidates.as_slice() {
        [] => Err(Command::Unknown(word.to_string())),
        [only] => Ok(*only),
        _ => Err(Command::Ambiguous {
            word: word.to_string(),
            candidates,
        }),
    }
}

fn parse_trace(args: &str) -> Command {
    match args.to_ascii_lowercase().as_str() {
        "" => Command::Trace(None),
        "on" => Command::Trace(Some(true)),
        "off" => Command::Trace(Some(false)),
        _ => Command::BadArgument {
            command: "trace",
            argument: args.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_full_words() {
        assert_eq!(parse("help"), Command::Help);
        assert_eq!(parse("status"), Command::Status);
        assert_eq!(parse("run"), Command::Run);
        assert_eq!(parse("step"), Command::Step);
        assert_eq!(parse("  STEP  "), Command::Step);
        for word in ["quit", "halt", "stop", "exit"] {
            assert_eq!(parse(word), Command::Quit, "{word}");
        }
    }

    #[test]
    fn test_unambiguous_prefixes() {
        assert_eq!(parse("q"), Command::Quit);
        assert_eq!(parse("r"), Command::Run);
        assert_eq!(parse("ste"), Command::Step);
        assert_eq!(parse("stat"), Command::Status);
        assert_eq!(parse("sto"), Command::Quit);
        assert_eq!(parse("he"), Command::Help);
        assert_eq!(parse("t"), Command::Trace(None));
    }

    #[test]
    fn test_ambiguous_prefix_lists_candidates() {
        assert_eq!(
            parse("s"),
            Command::Ambiguous {
                word: "s".to_string(),
                candidates: vec!["status", "stop", "step"],
            }
        );
        assert_eq!(
            parse("h"),
            Command::Ambiguous {
                word: "h".to_string(),
                candidates: vec!["help", "halt"],
            }
        );
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(parse("continue"), Command::Unknown("continue".to_string()));
        assert_eq!(parse(""), Command::Empty);
        assert_eq!(parse("   "), Command::Empty);
        assert_eq!(parse("# note"), Command::Empty);
    }

    #[test]
    fn test_trace_arguments() {
        assert_eq!(parse("trace on"), Command::Trace(Some(true)));
        assert_eq!(parse("tr OFF"), Command::Trace(Some(false)));
        assert_eq!(
            parse("trace loud"),
            Command::BadArgument {
                command: "trace",
                argument: "loud".to_string(),
            }
        );
        assert_eq!(
            parse("run twice"),
            Command::BadArgument {
                command: "run",
                argument: "twice".to_string(),
            }
        );
    }
}
