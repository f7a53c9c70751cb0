//! Command loop driving one machine

use crate::DebugError;
use crate::commands::{self, COMMAND_WORDS, Command};
use ocprs::program::dump::format_instruction;
use ocprs::{
    Instruction, Machine, NoMatchPolicy, Observer, Phase, Program, Status, TraceContext, VmOptions,
};
use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::rc::Rc;

pub const PROMPT: &str = "ocpdb> ";

/// Records one line per executed instruction; the session drains the
/// lines after every step.
struct TraceObserver {
    lines: Rc<RefCell<Vec<String>>>,
}

impl Observer for TraceObserver {
    fn on_instruction(&mut self, ctx: &TraceContext<'_>, instruction: Instruction) -> bool {
        let phase = match ctx.phase {
            Phase::Match => "match ",
            Phase::Action => "action",
        };
        let mut num = itoa::Buffer::new();
        let mut line = String::from("  ");
        line.push_str(ctx.state_name());
        line.push('/');
        line.push_str(num.format(ctx.rule));
        line.push_str(&format!(" {:4} {phase} ", ctx.pc));
        line.push_str(&format_instruction(ctx.program, instruction));
        line.push_str("  @");
        line.push_str(num.format(ctx.position + ctx.matched));
        self.lines.borrow_mut().push(line);
        true
    }
}

/// A debugging session over one program and one complete input.
///
/// Commands are read line by line from `commands`; everything the session
/// prints, prompt included, goes to `out`.
pub struct Session<'p, R, W> {
    machine: Machine<'p>,
    commands: R,
    out: W,
    trace: Option<Rc<RefCell<Vec<String>>>>,
}

impl<'p, R: BufRead, W: Write> Session<'p, R, W> {
    pub fn new(program: &'p Program, input: &[u32], commands: R, out: W) -> Self {
        Self::with_options(program, input, VmOptions::default(), commands, out)
    }

    pub fn with_options(
        program: &'p Program,
        input: &[u32],
        options: VmOptions,
        commands: R,
        out: W,
    ) -> Self {
        let mut machine = Machine::with_options(program, options);
        machine.feed(input);
        machine.finish();
        Session {
            machine,
            commands,
            out,
            trace: None,
        }
    }

    /// Read and execute commands until a quit command or end of the
    /// command stream
    pub fn run(&mut self) -> Result<(), DebugError> {
        log::debug!("debug session started in state `{}`", self.machine.state_name());
        let mut line = String::new();
        loop {
            self.out.write_all(PROMPT.as_bytes())?;
            self.out.flush()?;

            line.clear();
            if self.commands.read_line(&mut line)? == 0 {
                writeln!(self.out)?;
                break;
            }
            if !self.execute(commands::parse(&line))? {
                break;
            }
        }
        log::debug!("debug session ended after {} steps", self.machine.steps());
        Ok(())
    }

    /// Run one command; `false` ends the session
    pub fn execute(&mut self, command: Command) -> Result<bool, DebugError> {
        match command {
            Command::Help => self.cmd_help()?,
            Command::Status => self.cmd_status()?,
            Command::Step => self.cmd_step()?,
            Command::Run => self.cmd_run()?,
            Command::Trace(setting) => self.cmd_trace(setting)?,
            Command::Quit => return Ok(false),
            Command::Empty => {}
            Command::Ambiguous { word, candidates } => {
                writeln!(
                    self.out,
                    "ambiguous command `{word}`: {}",
                    candidates.join(", ")
                )?;
            }
            Command::Unknown(word) => {
                writeln!(self.out, "unknown command `{word}`; try `help`")?;
            }
            Command::BadArgument { command, argument } => {
                writeln!(self.out, "`{command}` does not take `{argument}`")?;
            }
        }
        Ok(true)
    }

    fn cmd_help(&mut self) -> Result<(), DebugError> {
        writeln!(self.out, "commands (any unambiguous prefix works):")?;
        for word in COMMAND_WORDS {
            let text = match word {
                "help" => "list commands",
                "status" => "show machine state and the current state's rules",
                "run" => "apply rules until the input is used up",
                "step" => "apply one rule",
                "trace" => "trace [on|off]: print every instruction executed",
                _ => "end the session",
            };
            writeln!(self.out, "  {word:<8}{text}")?;
        }
        Ok(())
    }

    fn cmd_status(&mut self) -> Result<(), DebugError> {
        let machine = &self.machine;
        writeln!(
            self.out,
            "state `{}`, position {}, {} steps, {}",
            machine.state_name(),
            machine.position(),
            machine.steps(),
            status_text(machine.status())
        )?;
        writeln!(self.out, "pending: {}", render(machine.pending()))?;
        writeln!(self.out, "output:  {}", render(machine.output()))?;
        let options = machine.options();
        let policy = match options.no_match {
            NoMatchPolicy::Fault => "fault",
            NoMatchPolicy::PassThrough => "pass through",
            NoMatchPolicy::Drop => "drop",
        };
        match options.max_steps {
            Some(limit) => writeln!(self.out, "no match: {policy}, idle step limit {limit}")?,
            None => writeln!(self.out, "no match: {policy}, no step limit")?,
        }

        let program = machine.program();
        if let Some(state) = program.state(machine.state()) {
            for (index, rule) in state.rules.iter().enumerate() {
                writeln!(self.out, "rule {index} (line {})", rule.line)?;
                for (pc, &instruction) in rule.code.iter().enumerate() {
                    writeln!(
                        self.out,
                        "  {pc:4}  {}",
                        format_instruction(program, instruction)
                    )?;
                }
            }
        }
        Ok(())
    }

    fn cmd_step(&mut self) -> Result<(), DebugError> {
        let before = self.machine.output().len();
        let result = self.machine.step();
        self.flush_trace()?;
        match result {
            Ok(true) => {
                let emitted = render(&self.machine.output()[before..]);
                writeln!(
                    self.out,
                    "step {}: now in state `{}` at position {}, emitted {emitted}",
                    self.machine.steps(),
                    self.machine.state_name(),
                    self.machine.position()
                )?;
            }
            Ok(false) => self.report_stop()?,
            Err(err) => writeln!(self.out, "fault: {err}")?,
        }
        Ok(())
    }

    fn cmd_run(&mut self) -> Result<(), DebugError> {
        loop {
            let result = self.machine.step();
            self.flush_trace()?;
            match result {
                Ok(true) => {}
                Ok(false) => break,
                Err(err) => {
                    writeln!(self.out, "fault: {err}")?;
                    return Ok(());
                }
            }
        }
        self.report_stop()?;
        writeln!(self.out, "output: {}", render(self.machine.output()))?;
        Ok(())
    }

    fn cmd_trace(&mut self, setting: Option<bool>) -> Result<(), DebugError> {
        let on = setting.unwrap_or(self.trace.is_none());
        match (on, self.trace.is_some()) {
            (true, false) => {
                let lines = Rc::new(RefCell::new(Vec::new()));
                self.machine.attach_observer(Box::new(TraceObserver {
                    lines: Rc::clone(&lines),
                }));
                self.trace = Some(lines);
            }
            (false, true) => {
                self.machine.detach_observer();
                self.trace = None;
            }
            _ => {}
        }
        writeln!(self.out, "trace {}", if on { "on" } else { "off" })?;
        Ok(())
    }

    fn flush_trace(&mut self) -> Result<(), DebugError> {
        if let Some(lines) = &self.trace {
            for line in lines.borrow_mut().drain(..) {
                writeln!(self.out, "{line}")?;
            }
        }
        Ok(())
    }

    fn report_stop(&mut self) -> Result<(), DebugError> {
        writeln!(
            self.out,
            "{} in state `{}` after {} steps",
            status_text(self.machine.status()),
            self.machine.state_name(),
            self.machine.steps()
        )?;
        Ok(())
    }

    pub fn machine(&self) -> &Machine<'p> {
        &self.machine
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace.is_some()
    }

    pub fn into_output(self) -> W {
        self.out
    }
}

fn status_text(status: Status) -> &'static str {
    match status {
        Status::Ready => "ready",
        Status::NeedsInput => "waiting for input",
        Status::Halted => "halted",
        Status::Stopped => "stopped",
    }
}

/// Quoted text; codes that are not characters show as `\u{…}` escapes
fn render(codes: &[u32]) -> String {
    let mut text = String::from("\"");
    for &code in codes {
        match char::from_u32(code) {
            Some(ch) => text.extend(ch.escape_debug()),
            None => text.push_str(&format!("\\u{{{code:x}}}")),
        }
    }
    text.push('"');
    text
}
